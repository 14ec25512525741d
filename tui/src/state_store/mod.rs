pub mod action;
mod state;
mod state_store;
mod studio;

pub use self::{
    state::{LogLevel, LogLine, LoginStatus, State},
    state_store::StateStore,
    studio::Studio,
};
