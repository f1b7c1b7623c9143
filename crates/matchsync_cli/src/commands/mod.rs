pub(crate) mod cache;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod sync;
