use crate::runtime::executor::{ExecContext, Vm};
use crate::runtime::result::ExecOutput;
use crate::runtime::state::StateStore;
use alloy_primitives::{Address, Bytes};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Create,
    #[default]
    Call,
}

/// A prepared invocation. Preparing has already applied its side effects to
/// the state, so executing it repeatedly (benchmarks) is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Create { payload: Bytes },
    Call { receiver: Address, input: Bytes },
}

impl Dispatch {
    /// Build the invocation for `mode`.
    ///
    /// Create mode deploys `code ++ input` and never touches the receiver.
    /// Call mode installs non-empty `code` at `receiver`; empty code leaves
    /// whatever the receiver already holds in effect.
    pub fn prepare(
        mode: Mode,
        code: Bytes,
        input: Bytes,
        receiver: Address,
        state: &mut StateStore,
    ) -> Self {
        match mode {
            Mode::Create => {
                let mut payload = Vec::with_capacity(code.len() + input.len());
                payload.extend_from_slice(&code);
                payload.extend_from_slice(&input);
                debug!(len = payload.len(), "prepared create payload");
                Dispatch::Create {
                    payload: payload.into(),
                }
            }
            Mode::Call => {
                if !code.is_empty() {
                    debug!(receiver = %receiver, len = code.len(), "installing code at receiver");
                    state.set_code(receiver, code);
                }
                Dispatch::Call { receiver, input }
            }
        }
    }

    pub fn execute<V: Vm>(&self, vm: &mut V, ctx: &mut ExecContext<'_>) -> ExecOutput {
        match self {
            Dispatch::Create { payload } => vm.create(payload.clone(), ctx),
            Dispatch::Call { receiver, input } => vm.call(*receiver, input.clone(), ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::executor::ExecutionConfig;
    use crate::runtime::genesis::Genesis;
    use crate::tracer::{LogConfig, Tracer};
    use alloy_primitives::U256;

    #[derive(Default)]
    struct RecordingVm {
        calls: Vec<(Option<Address>, Bytes)>,
    }

    impl Vm for RecordingVm {
        fn create(&mut self, input: Bytes, _ctx: &mut ExecContext<'_>) -> ExecOutput {
            self.calls.push((None, input));
            ExecOutput::default()
        }

        fn call(&mut self, receiver: Address, input: Bytes, ctx: &mut ExecContext<'_>) -> ExecOutput {
            self.calls.push((Some(receiver), input));
            ExecOutput {
                output: ctx.state.code(receiver),
                gas_left: ctx.config.gas_limit,
                error: None,
            }
        }
    }

    fn receiver() -> Address {
        Address::left_padding_from(b"receiver")
    }

    fn run(dispatch: &Dispatch, state: &mut StateStore, vm: &mut RecordingVm) -> ExecOutput {
        let config = ExecutionConfig::new(
            &Genesis::default(),
            Address::left_padding_from(b"sender"),
            1_000,
            U256::ZERO,
            U256::ZERO,
            false,
        );
        let mut tracer = Tracer::select(false, false, LogConfig::default(), Box::new(std::io::sink()));
        let mut ctx = ExecContext {
            config: &config,
            state,
            tracer: &mut tracer,
        };
        dispatch.execute(vm, &mut ctx)
    }

    #[test]
    fn create_concatenates_code_and_input() {
        let mut state = StateStore::new();
        let dispatch = Dispatch::prepare(
            Mode::Create,
            Bytes::from_static(&[0x60, 0x00]),
            Bytes::from_static(&[0xaa, 0xbb]),
            receiver(),
            &mut state,
        );
        assert_eq!(
            dispatch,
            Dispatch::Create {
                payload: Bytes::from_static(&[0x60, 0x00, 0xaa, 0xbb])
            }
        );
        assert!(state.code(receiver()).is_empty());

        let mut vm = RecordingVm::default();
        run(&dispatch, &mut state, &mut vm);
        assert_eq!(vm.calls, [(None, Bytes::from_static(&[0x60, 0x00, 0xaa, 0xbb]))]);
    }

    #[test]
    fn call_installs_code_before_invocation() {
        let mut state = StateStore::new();
        state.set_code(receiver(), Bytes::from_static(&[0x00]));
        let code = Bytes::from_static(&[0x60, 0x00, 0x52]);
        let dispatch = Dispatch::prepare(Mode::Call, code.clone(), Bytes::new(), receiver(), &mut state);

        let mut vm = RecordingVm::default();
        let out = run(&dispatch, &mut state, &mut vm);
        assert_eq!(out.output, code);
        assert_eq!(vm.calls, [(Some(receiver()), Bytes::new())]);
    }

    #[test]
    fn call_with_empty_code_keeps_existing_code() {
        let mut state = StateStore::new();
        state.set_code(receiver(), Bytes::from_static(&[0x5b]));
        let dispatch = Dispatch::prepare(
            Mode::Call,
            Bytes::new(),
            Bytes::from_static(&[0x01]),
            receiver(),
            &mut state,
        );

        let mut vm = RecordingVm::default();
        let out = run(&dispatch, &mut state, &mut vm);
        assert_eq!(out.output, Bytes::from_static(&[0x5b]));
        assert_eq!(vm.calls[0].1, Bytes::from_static(&[0x01]));
    }

    #[test]
    fn repeated_execution_reuses_the_prepared_payload() {
        let mut state = StateStore::new();
        let dispatch = Dispatch::prepare(
            Mode::Create,
            Bytes::from_static(&[0x00]),
            Bytes::new(),
            receiver(),
            &mut state,
        );
        let mut vm = RecordingVm::default();
        for _ in 0..3 {
            run(&dispatch, &mut state, &mut vm);
        }
        assert_eq!(vm.calls.len(), 3);
        assert!(vm.calls.iter().all(|(to, input)| to.is_none() && input[..] == [0x00]));
    }
}
