pub(crate) mod user_repository;
