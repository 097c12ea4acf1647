pub use arrayvec::*;
pub use boolinator::Boolinator;
pub use derive_more;
pub use itertools::*;
pub use num_traits;
pub use ordered_float::OrderedFloat;
pub use rand::prelude::*;
pub use thiserror::{self, Error};

pub use logging::{self, prelude::*};
pub use newtype::NormalizedFloat;

// common imports that annoyingly get resolved to other pub exports of std/core
pub use std::{
    error::Error as StdError,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
    marker::PhantomData,
};

pub type BoxedResult<T> = Result<T, Box<dyn StdError>>;

pub mod newtype;
