#[cfg(unix)]
mod helpers;

mod error {
    mod config;
    mod launch;
}

#[cfg(unix)]
mod process {
    mod handle;
    mod scoped;
}

#[cfg(unix)]
mod server {
    mod streaming;
}
