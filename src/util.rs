/// Newtype around `T` so collection-shaped transforms (merging, deduping) can
/// hang off it without orphan-rule friction.
pub struct Wrapper<T>(pub T);

impl<T> From<T> for Wrapper<T> {
  fn from(value: T) -> Self {
    Wrapper(value)
  }
}
