mod bootstrap;
mod loop_runner;
mod settings;

pub(crate) use loop_runner::run;
