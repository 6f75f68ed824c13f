//! Minimal per-sample stateful processing trait.
//!
//! Unlike the async-stream `Scanner` the wider modem stack builds on, this
//! one assumes nothing about suspension: `scan` is called once per sample
//! from a plain loop over a `&[i16]` slice.

pub trait Scanner<S> {
    type Output;

    fn scan(&mut self, sample: S) -> Self::Output;
}

impl<T, S> Scanner<S> for &mut T
where
    T: Scanner<S>,
{
    type Output = T::Output;

    fn scan(&mut self, sample: S) -> Self::Output {
        (**self).scan(sample)
    }
}
