pub(crate) mod events;
pub(crate) mod meta;
pub(crate) mod shared;
pub(crate) mod sync;
