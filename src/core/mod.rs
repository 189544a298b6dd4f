//! Core Infrastructure
//!
//! Collaborators the token manager depends on: clock, identifier generator,
//! password hasher and input validation.

pub mod clock;
pub mod hasher;
pub mod id;
pub mod validation;

// Clock
pub use clock::{create_mock_clock, create_system_clock, Clock, MockClock, SystemClock};

// Hasher
pub use hasher::{
    create_mock_password_hasher, HmacPasswordHasher, MockPasswordHasher, PasswordHasher,
    ENV_HASHING_SECRET,
};

// Identifier generation
pub use id::{
    create_id_generator, create_mock_id_generator, IdGenerator, MockIdGenerator,
    RandomIdGenerator,
};

// Validation
pub use validation::{required_bool, required_str, InputValidator};
