//! Provisioning modules built into the library.

pub mod selftest;
