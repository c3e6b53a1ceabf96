pub mod key_lock;

pub use key_lock::KeyedMutex;
