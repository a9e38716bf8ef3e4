// ABOUTME: Event interception and redistribution.
// ABOUTME: Applies per-type decision handlers to the raw feed and fans the result out.

mod distributor;
mod event;
mod interceptor;

pub use distributor::{Distributor, DistributorError, State, SUBSCRIBER_BUFFER};
pub use event::Event;
pub use interceptor::{Decision, FnInterceptor, Interceptor, Interceptors, from_fn};
