//! Submission phase trait and the closure adapter.
//!
//! A [`Submission`] supplies the three opaque asynchronous phases the
//! orchestrator drives: build the transaction, prove it (the slow step),
//! submit it to the network. The engine imposes no contract on phase
//! internals beyond "it eventually settles or the proving timeout fires".

use crate::error::BoxError;
use async_trait::async_trait;
use std::future::Future;

/// The three phases of one logical submission.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (callers may want `Box<dyn Submission>` for dynamic dispatch). Methods
/// take `&self`; implementors that need per-call state (a nonce counter, a
/// connection pool) use interior mutability, and every phase may run again
/// from the top on retry. Output of a discarded attempt is never reused.
#[async_trait]
pub trait Submission: Send + Sync {
    /// Unproven transaction produced by `build`
    type Payload: Send;
    /// Proven transaction produced by `prove`
    type Proof: Send;
    /// Network acknowledgement produced by `submit`
    type Receipt: Send;

    /// Assemble the transaction. A wallet-style approval collaborator may
    /// reject here, before the slow step even starts.
    async fn build(&self) -> Result<Self::Payload, BoxError>;

    /// Generate the proof. This is the phase the orchestrator races against
    /// its timeout.
    async fn prove(&self, payload: Self::Payload) -> Result<Self::Proof, BoxError>;

    /// Submit the proven transaction. Re-invoked afresh on each retry; an
    /// implementation with non-idempotent effects must guard against
    /// duplicates itself (e.g. via a stable identifier).
    async fn submit(&self, proof: Self::Proof) -> Result<Self::Receipt, BoxError>;
}

/// Adapter lifting three closures into a [`Submission`].
pub struct SubmissionFns<B, P, S> {
    build: B,
    prove: P,
    submit: S,
}

impl<B, P, S> SubmissionFns<B, P, S> {
    /// Wrap `build`, `prove`, and `submit` functions as a submission.
    pub fn new(build: B, prove: P, submit: S) -> Self {
        Self {
            build,
            prove,
            submit,
        }
    }
}

#[async_trait]
impl<B, BFut, P, PFut, S, SFut, Tx, Pf, Rc> Submission for SubmissionFns<B, P, S>
where
    B: Fn() -> BFut + Send + Sync,
    BFut: Future<Output = Result<Tx, BoxError>> + Send + 'static,
    P: Fn(Tx) -> PFut + Send + Sync,
    PFut: Future<Output = Result<Pf, BoxError>> + Send + 'static,
    S: Fn(Pf) -> SFut + Send + Sync,
    SFut: Future<Output = Result<Rc, BoxError>> + Send + 'static,
    Tx: Send + 'static,
    Pf: Send + 'static,
    Rc: Send + 'static,
{
    type Payload = Tx;
    type Proof = Pf;
    type Receipt = Rc;

    async fn build(&self) -> Result<Tx, BoxError> {
        (self.build)().await
    }

    async fn prove(&self, payload: Tx) -> Result<Pf, BoxError> {
        (self.prove)(payload).await
    }

    async fn submit(&self, proof: Pf) -> Result<Rc, BoxError> {
        (self.submit)(proof).await
    }
}
