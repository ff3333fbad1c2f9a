mod common;
mod validation;
mod workflow;
