//! Invoke helper for chaining builders

pub trait Invoke<A> {
	type Result;

	fn invoke(self, arg: A) -> Self::Result;
}

pub struct Identity;

impl<I> Invoke<I> for Identity {
	type Result = I;

	fn invoke(self, arg: I) -> I {
		arg
	}
}
