mod config;
mod process;
