pub(crate) mod user_service;
