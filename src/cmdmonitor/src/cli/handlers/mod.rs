mod run;
mod scan;
mod status;
mod tag;
mod test_notify;

pub(super) use run::run;
pub(super) use scan::scan;
pub(super) use status::status;
pub(super) use tag::{tag, untag};
pub(super) use test_notify::test_notify;
