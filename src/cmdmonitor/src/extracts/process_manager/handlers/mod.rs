pub(super) mod discovery;
pub(super) mod liveness;
pub(super) mod retention;
