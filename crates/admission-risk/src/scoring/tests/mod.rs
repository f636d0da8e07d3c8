mod common;
mod profile;
mod scorer;
