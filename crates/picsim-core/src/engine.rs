//! The simulation engine: owns every block and drives execution.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::{CoreConfig, MachineSnapshot, RunBoundary, RunOutcome, StepOutcome};
use crate::execute::{self, ExecContext};
use crate::fault::SimError;
use crate::memory::{CallStack, DataMemory, Eeprom, ProgramMemory, Sfr};
use crate::state::{RegisterFile, RunState};

/// Single-core simulator.
///
/// Blocks are shared through [`Arc`] so hosts can subscribe to them and read
/// them from other threads. `reset`, `load`, `step` and `snapshot` serialize
/// on one step lock; listeners run while it is held and must not call those
/// methods back.
#[derive(Debug)]
pub struct Engine {
    config: CoreConfig,
    registers: Arc<RegisterFile>,
    program: Arc<ProgramMemory>,
    data: Arc<DataMemory>,
    stack: Arc<CallStack>,
    eeprom: Arc<Eeprom>,
    step_lock: Mutex<()>,
    ready: AtomicBool,
    cycles: AtomicU64,
    stop_requested: AtomicBool,
    loads: AtomicU64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}

impl Engine {
    /// Builds an engine in [`RunState::Uninitialized`].
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            registers: Arc::new(RegisterFile::new()),
            program: Arc::new(ProgramMemory::new(config.program_memory_words)),
            data: Arc::new(DataMemory::new()),
            stack: Arc::new(CallStack::new()),
            eeprom: Arc::new(Eeprom::new(config.eeprom_bytes)),
            step_lock: Mutex::new(()),
            ready: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
            loads: AtomicU64::new(0),
        }
    }

    fn lock_step(&self) -> MutexGuard<'_, ()> {
        self.step_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn context(&self) -> ExecContext<'_> {
        ExecContext {
            registers: &self.registers,
            program: &self.program,
            data: &self.data,
            stack: &self.stack,
            eeprom: &self.eeprom,
            carry_polarity: self.config.carry_polarity,
        }
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// W, IR and PC.
    #[must_use]
    pub const fn registers(&self) -> &Arc<RegisterFile> {
        &self.registers
    }

    /// Program memory.
    #[must_use]
    pub const fn program_memory(&self) -> &Arc<ProgramMemory> {
        &self.program
    }

    /// Banked data memory.
    #[must_use]
    pub const fn data_memory(&self) -> &Arc<DataMemory> {
        &self.data
    }

    /// Return-address stack.
    #[must_use]
    pub const fn call_stack(&self) -> &Arc<CallStack> {
        &self.stack
    }

    /// Data EEPROM.
    #[must_use]
    pub const fn eeprom(&self) -> &Arc<Eeprom> {
        &self.eeprom
    }

    /// Working register.
    #[must_use]
    pub fn w(&self) -> u8 {
        self.registers.w()
    }

    /// Last fetched word.
    #[must_use]
    pub fn instruction_register(&self) -> u16 {
        self.registers.ir()
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.registers.pc()
    }

    /// Lifecycle state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        if self.ready.load(Ordering::Acquire) {
            RunState::Ready
        } else {
            RunState::Uninitialized
        }
    }

    /// Returns `true` once `reset()` has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.run_state().is_ready()
    }

    /// Cycles consumed since the last reset.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Power-on reset.
    ///
    /// Clears data memory and applies SFR power-on values, zeroes W, IR and
    /// PC, and empties the call stack. Program memory and EEPROM keep their
    /// contents.
    pub fn reset(&self) {
        let _guard = self.lock_step();
        self.data.clear();
        for sfr in Sfr::ALL {
            let value = sfr.power_on_value();
            if value != 0 {
                self.data.set_sfr(sfr, value);
            }
        }
        self.registers.reset();
        self.stack.clear();
        self.cycles.store(0, Ordering::Release);
        self.ready.store(true, Ordering::Release);
        info!("engine reset");
    }

    /// Loads a program image at address 0 and zero-fills the rest.
    ///
    /// Any `run()` in progress stops before executing a word of the new image.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ImageTooLarge`] or [`SimError::InvalidWord`]; program
    /// memory is unchanged in that case.
    pub fn load(&self, words: &[u16]) -> Result<usize, SimError> {
        let _guard = self.lock_step();
        self.loads.fetch_add(1, Ordering::AcqRel);
        let loaded = self.program.load(words).map_err(|err| {
            warn!(%err, class = ?err.class(), "program image rejected");
            err
        })?;
        info!(words = loaded, capacity = self.program.len(), "program loaded");
        Ok(loaded)
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotReady`] before the first reset. Instruction
    /// faults are reported as [`StepOutcome::Fault`], not as errors.
    pub fn step(&self) -> Result<StepOutcome, SimError> {
        let guard = self.lock_step();
        self.step_locked(&guard)
    }

    fn step_locked(&self, _guard: &MutexGuard<'_, ()>) -> Result<StepOutcome, SimError> {
        if !self.is_ready() {
            return Err(SimError::NotReady);
        }
        let outcome = execute::step_one(&self.context());
        self.cycles
            .fetch_add(u64::from(outcome.cycles()), Ordering::AcqRel);
        Ok(outcome)
    }

    /// Steps until `max_steps` is reached, `stop_at` accepts the new PC, or a
    /// stop is requested. Faulted steps count and do not end the run.
    ///
    /// A `load()` after the run started also ends it. The stop check and the
    /// step share one hold of the step lock, so no word of a newly loaded
    /// image executes. `stop_at` runs outside the lock.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotReady`] before the first reset.
    pub fn run<F>(&self, max_steps: usize, mut stop_at: F) -> Result<RunOutcome, SimError>
    where
        F: FnMut(u16) -> bool,
    {
        let loads_at_start = {
            let _guard = self.lock_step();
            if !self.is_ready() {
                return Err(SimError::NotReady);
            }
            self.stop_requested.store(false, Ordering::Release);
            self.loads.load(Ordering::Acquire)
        };
        debug!(max_steps, pc = self.pc(), "run started");

        let mut steps = 0;
        let mut faults = 0;
        let boundary = loop {
            if steps >= max_steps {
                break RunBoundary::StepLimit;
            }
            let outcome = {
                let guard = self.lock_step();
                if self.stop_requested.load(Ordering::Acquire)
                    || self.loads.load(Ordering::Acquire) != loads_at_start
                {
                    break RunBoundary::StopRequested;
                }
                self.step_locked(&guard)?
            };
            steps += 1;
            if outcome.fault().is_some() {
                faults += 1;
            }
            if stop_at(outcome.next_pc()) {
                break RunBoundary::StopCondition;
            }
        };

        let outcome = RunOutcome {
            steps,
            faults,
            boundary,
            pc: self.pc(),
        };
        debug!(?outcome, "run finished");
        Ok(outcome)
    }

    /// Asks a running `run()` to return before its next step.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Copies the whole machine between steps.
    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        let _guard = self.lock_step();
        MachineSnapshot {
            run_state: self.run_state(),
            cycles: self.cycles(),
            registers: self.registers.snapshot(),
            data: self.data.snapshot(),
            call_stack: self.stack.snapshot(),
            program: self.program.snapshot(),
            eeprom: self.eeprom.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::api::{CoreConfig, RunBoundary};
    use crate::fault::SimError;
    use crate::memory::sfr::{OPTION_POWER_ON, STATUS_POWER_ON, TRISA_POWER_ON, TRISB_POWER_ON};
    use crate::memory::{Bank, Sfr};
    use crate::state::RunState;

    #[test]
    fn step_before_reset_is_not_ready() {
        let engine = Engine::default();
        assert_eq!(engine.run_state(), RunState::Uninitialized);
        assert_eq!(engine.step(), Err(SimError::NotReady));
        assert_eq!(engine.run(10, |_| false), Err(SimError::NotReady));
    }

    #[test]
    fn reset_applies_power_on_values() {
        let engine = Engine::default();
        engine.data_memory().set(Bank::Bank0, 0x30, 0xAA).unwrap();
        engine.registers().set_w(0x12);
        engine.call_stack().push(0x10).unwrap();
        engine.eeprom().set(0, 0x5A).unwrap();

        engine.reset();

        let data = engine.data_memory();
        assert_eq!(data.sfr(Sfr::Status), STATUS_POWER_ON);
        assert_eq!(data.sfr(Sfr::Option), OPTION_POWER_ON);
        assert_eq!(data.sfr(Sfr::Trisa), TRISA_POWER_ON);
        assert_eq!(data.sfr(Sfr::Trisb), TRISB_POWER_ON);
        assert_eq!(data.get(Bank::Bank1, 0x30), Ok(0));
        assert_eq!((engine.w(), engine.pc(), engine.instruction_register()), (0, 0, 0));
        assert!(engine.call_stack().is_empty());
        assert_eq!(engine.eeprom().get(0), Ok(0x5A));
        assert!(engine.is_ready());
    }

    #[test]
    fn run_stops_at_budget_and_predicate() {
        let engine = Engine::new(CoreConfig {
            program_memory_words: 16,
            ..CoreConfig::default()
        });
        engine.load(&[0x0000, 0x0000, 0x2800]).unwrap();
        engine.reset();

        let limited = engine.run(2, |_| false).unwrap();
        assert_eq!((limited.steps, limited.boundary, limited.pc), (2, RunBoundary::StepLimit, 2));

        let stopped = engine.run(100, |pc| pc == 0).unwrap();
        assert_eq!(stopped.boundary, RunBoundary::StopCondition);
        assert_eq!(stopped.steps, 1);
        assert_eq!(engine.cycles(), 4);
    }

    #[test]
    fn stop_request_from_predicate_ends_run() {
        let engine = Engine::default();
        engine.reset();
        let outcome = engine
            .run(1000, |_| {
                engine.request_stop();
                false
            })
            .unwrap();
        assert_eq!((outcome.steps, outcome.boundary), (1, RunBoundary::StopRequested));
    }

    #[test]
    fn load_from_predicate_ends_run_before_new_image_executes() {
        let engine = Engine::default();
        engine.reset();
        let outcome = engine
            .run(100, |_| {
                engine.load(&[0x3077; 16]).unwrap();
                false
            })
            .unwrap();
        assert_eq!((outcome.steps, outcome.boundary), (1, RunBoundary::StopRequested));
        assert_eq!(engine.w(), 0);
        assert_eq!(engine.pc(), 1);
    }

    #[test]
    fn snapshot_reflects_machine_state() {
        let engine = Engine::default();
        engine.load(&[0x3042]).unwrap();
        engine.reset();
        engine.step().unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.registers.w, 0x42);
        assert_eq!(snapshot.registers.pc, 1);
        assert_eq!(snapshot.program[0], 0x3042);
        assert_eq!(snapshot.cycles, 1);
        assert_eq!(snapshot.run_state, RunState::Ready);
        assert_eq!(snapshot.data.get(Bank::Bank0, 0x02), Some(1));
    }
}
