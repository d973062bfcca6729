pub(crate) mod builder;
pub(crate) mod descriptor;
pub(crate) mod graph;
pub(crate) mod snapshot;
