#[cfg(test)]
pub mod impl_fake;
pub mod impl_sqlite;
pub mod interface;
