mod cli_overrides;
mod error_handling;
mod fs_abstraction;
