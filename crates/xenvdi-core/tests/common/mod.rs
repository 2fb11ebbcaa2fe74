//! Test doubles for the management API and the conversion tool.
//!
//! Both doubles append to a shared [`Journal`] so tests can assert on the
//! relative order of remote calls and process launches.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use xenvdi_core::{Invocation, ProcessOutput, ProcessRunner, Result, Transport, Value};

pub const SESSION_ID: &str = "OpaqueRef:session-1";
pub const SR_REF: &str = "OpaqueRef:sr-1";
pub const VDI_REF: &str = "OpaqueRef:vdi-1";
pub const VDI_UUID: &str = "0f8e6a52-1b3c-4d5e-8f90-123456789abc";

/// Ordered record of everything the doubles observed.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn index_of(&self, prefix: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e.starts_with(prefix))
    }
}

fn status_struct(status: &str, key: &str, value: Value) -> Value {
    let mut members = BTreeMap::new();
    members.insert("Status".to_string(), Value::from(status));
    members.insert(key.to_string(), value);
    Value::Struct(members)
}

fn success(value: &str) -> Value {
    status_struct("Success", "Value", Value::from(value))
}

fn failure(description: &[String]) -> Value {
    status_struct(
        "Failure",
        "ErrorDescription",
        Value::Array(description.iter().map(|d| Value::from(d.as_str())).collect()),
    )
}

/// A management API that answers every call this tool makes.
pub struct FakeTransport {
    journal: Journal,
    calls: RefCell<Vec<(String, Vec<Value>)>>,
    failures: HashMap<String, Vec<String>>,
}

impl FakeTransport {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            calls: RefCell::new(Vec::new()),
            failures: HashMap::new(),
        }
    }

    /// Make `method` answer with a failure status.
    pub fn failing(mut self, method: &str, description: &[&str]) -> Self {
        self.failures.insert(
            method.to_string(),
            description.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.borrow().clone()
    }

    /// Parameters of the first call to `method`.
    pub fn params_of(&self, method: &str) -> Option<Vec<Value>> {
        self.calls
            .borrow()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }
}

impl Transport for FakeTransport {
    fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        self.journal.push(format!("rpc:{}", method));
        self.calls
            .borrow_mut()
            .push((method.to_string(), params.to_vec()));

        if let Some(description) = self.failures.get(method) {
            return Ok(failure(description));
        }

        Ok(match method {
            "session.login_with_password" => success(SESSION_ID),
            "session.logout" => success(""),
            "SR.get_by_uuid" => success(SR_REF),
            "VDI.create" => success(VDI_REF),
            "VDI.get_uuid" => success(VDI_UUID),
            other => failure(&["MESSAGE_METHOD_UNKNOWN".to_string(), other.to_string()]),
        })
    }
}

/// A conversion tool that records its invocations.
pub struct FakeRunner {
    journal: Journal,
    runs: RefCell<Vec<Invocation>>,
    captures: RefCell<Vec<Invocation>>,
    run_exit: i32,
    info_output: ProcessOutput,
}

impl FakeRunner {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            runs: RefCell::new(Vec::new()),
            captures: RefCell::new(Vec::new()),
            run_exit: 0,
            info_output: info_output(1_073_741_824),
        }
    }

    /// Exit code returned by `qemu-img convert`.
    pub fn with_run_exit(mut self, code: i32) -> Self {
        self.run_exit = code;
        self
    }

    /// Virtual size reported by `qemu-img info`.
    pub fn with_info_size(mut self, size: u64) -> Self {
        self.info_output = info_output(size);
        self
    }

    pub fn with_info_output(mut self, output: ProcessOutput) -> Self {
        self.info_output = output;
        self
    }

    pub fn runs(&self) -> Vec<Invocation> {
        self.runs.borrow().clone()
    }

    pub fn captures(&self) -> Vec<Invocation> {
        self.captures.borrow().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.journal.push(format!("run:{}", invocation));
        self.runs.borrow_mut().push(invocation.clone());
        Ok(ProcessOutput::exited(self.run_exit))
    }

    fn capture(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.journal.push(format!("capture:{}", invocation));
        self.captures.borrow_mut().push(invocation.clone());
        Ok(self.info_output.clone())
    }
}

/// Successful `qemu-img info --output=json` output for a raw image.
pub fn info_output(virtual_size: u64) -> ProcessOutput {
    let json = format!(
        r#"{{
    "virtual-size": {},
    "filename": "/tmp/in.raw",
    "format": "raw",
    "actual-size": 4096,
    "dirty-flag": false
}}"#,
        virtual_size
    );
    ProcessOutput {
        code: Some(0),
        stdout: json.into_bytes(),
        stderr: Vec::new(),
    }
}
