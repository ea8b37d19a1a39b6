pub mod cli;
pub mod config;
pub mod pipeline;
pub mod sql;
pub mod warehouse;

pub mod util {
    pub mod env;
}
