use crate::traits::U8Array;
use zeroize::Zeroize;

/// A `U8Array` that is wiped when dropped. Used for every secret key.
pub struct Sensitive<A: U8Array>(A);

impl<A> Drop for Sensitive<A>
where
    A: U8Array,
{
    fn drop(&mut self) {
        self.0.as_mut().zeroize();
    }
}

impl<A> Clone for Sensitive<A>
where
    A: U8Array,
{
    fn clone(&self) -> Self {
        Sensitive(A::from_slice(self.0.as_slice()))
    }
}

impl<A> U8Array for Sensitive<A>
where
    A: U8Array,
{
    fn new() -> Self {
        Sensitive(A::new())
    }

    fn new_with(v: u8) -> Self {
        Sensitive(A::new_with(v))
    }

    fn from_slice(s: &[u8]) -> Self {
        Sensitive(A::from_slice(s))
    }

    fn len() -> usize {
        A::len()
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    fn as_mut(&mut self) -> &mut [u8] {
        self.0.as_mut()
    }
}

impl<A> std::fmt::Debug for Sensitive<A>
where
    A: U8Array,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Sensitive([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak() {
        let s = Sensitive::<[u8; 32]>::new_with(0xab);
        assert_eq!(format!("{:?}", s), "Sensitive([REDACTED])");
    }

    #[test]
    fn clone_copies_contents() {
        let s = Sensitive::<[u8; 32]>::new_with(7);
        let c = s.clone();
        assert_eq!(s.as_slice(), c.as_slice());
    }
}
