//! Recording test doubles shared by the wrapper and comprised-command tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use robocmd_kernel::{Command, CommandHandle, CommandScheduler, Subsystem, SubsystemHandle};
use robocmd_types::SubsystemId;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct Stub(pub SubsystemId);

impl Subsystem for Stub {
    fn id(&self) -> &SubsystemId {
        &self.0
    }
}

pub fn scheduler(subsystems: &[&str]) -> CommandScheduler {
    let mut scheduler = CommandScheduler::new();
    for id in subsystems {
        scheduler
            .register_subsystem(SubsystemHandle::new(Stub((*id).into())))
            .unwrap();
    }
    scheduler
}

pub struct Recorder {
    pub name: String,
    pub reqs: Vec<SubsystemId>,
    pub log: Log,
    pub finish_after: Option<u32>,
    pub executed: u32,
    pub ready: Rc<Cell<bool>>,
}

impl Recorder {
    pub fn new(name: &str, reqs: &[&str], log: &Log) -> Self {
        Self {
            name: name.to_string(),
            reqs: reqs.iter().map(|r| SubsystemId::from(*r)).collect(),
            log: log.clone(),
            finish_after: None,
            executed: 0,
            ready: Rc::new(Cell::new(true)),
        }
    }

    pub fn finishing_after(mut self, ticks: u32) -> Self {
        self.finish_after = Some(ticks);
        self
    }

    pub fn handle(self) -> CommandHandle {
        CommandHandle::new(self)
    }
}

impl Command for Recorder {
    fn name(&self) -> &str {
        &self.name
    }
    fn requirements(&self) -> &[SubsystemId] {
        &self.reqs
    }
    fn is_ready(&self) -> bool {
        self.ready.get()
    }
    fn initialize(&mut self) {
        self.executed = 0;
        self.log.borrow_mut().push(format!("{}.init", self.name));
    }
    fn execute(&mut self) {
        self.executed += 1;
        self.log.borrow_mut().push(format!("{}.exec", self.name));
    }
    fn is_finished(&self) -> bool {
        self.finish_after.is_some_and(|n| self.executed >= n)
    }
    fn end(&mut self, interrupted: bool) {
        self.log
            .borrow_mut()
            .push(format!("{}.end({interrupted})", self.name));
    }
}

pub fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}
