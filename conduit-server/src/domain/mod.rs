pub(crate) mod error;
pub(crate) mod etag;
pub(crate) mod password;
pub(crate) mod user;
pub(crate) mod value_objects;
