pub mod hasher;
pub mod scanner;

pub use hasher::{fingerprint, FileIdentity};
pub use scanner::Scanner;
