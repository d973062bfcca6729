pub(crate) mod job;
pub(crate) mod manifest;
pub(crate) mod runner;
pub(crate) mod slots;
