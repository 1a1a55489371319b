use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use log::info;

use super::analysis::{Globals, Unavailable};
use super::reader;
use super::representation::Representation;
use super::token::TokenStructure;
use super::unit::{Unit, UnitGraph, UnitId};

/// The ambient global environment: names the user has bound so far.
///
/// This is the oracle the analyzer consults; binding a name here is what
/// turns a free identifier into a resolved one.
#[derive(Debug, Default)]
pub struct Environment(HashMap<String, String>);

impl Environment {
    /// Binds `name`, replacing any previous binding.
    pub fn bind(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl Globals for Environment {
    fn is_defined(&self, name: &str) -> Result<bool, Unavailable> {
        Ok(self.0.contains_key(name))
    }
}

// ----------------------------------------------------------------------------

/// The interpreter's visible state: where the user is in the unit graph,
/// which units are top-level, and any messages waiting to be shown.
#[derive(Debug)]
pub struct State {
    pub current: UnitId,
    pub toplevel: Vec<UnitId>,
    pub prompts: Vec<String>,
}

// ----------------------------------------------------------------------------

/// A line-command interpreter over a unit graph.
///
/// Commands create and navigate units, attach representations, bind global
/// names, and test the current unit for well-definedness. Errors become
/// message prompts; the interpreter itself never fails a line.
pub struct Interpreter {
    graph: UnitGraph,
    environment: Environment,
    state: State,
    done: bool,
}

impl Default for Interpreter {
    fn default() -> Self { Self::new() }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut graph = UnitGraph::new();
        let root = graph.insert(Unit::new(vec![Representation::Text("top".into())]));
        Self {
            graph,
            environment: Environment::default(),
            state: State { current: root, toplevel: vec![root], prompts: Vec::new() },
            done: false,
        }
    }

    pub fn is_done(&self) -> bool { self.done }

    pub fn state(&self) -> &State { &self.state }

    pub fn graph(&self) -> &UnitGraph { &self.graph }

    pub fn environment(&self) -> &Environment { &self.environment }

    /// Drains the pending message prompts.
    pub fn take_prompts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.state.prompts)
    }

    /// Interprets one line of input.
    pub fn interpret(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() { return; }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        info!("command '{}' with '{}'", command, rest);
        match command {
            "new" => self.command_new(rest),
            "enter" => self.command_enter(rest),
            "leave" => self.command_leave(),
            "bind" => self.command_bind(rest),
            "define" => self.command_define(rest),
            "note" => self.command_note(rest),
            "check" => self.command_check(),
            "show" => self.command_show(),
            "quit" => { self.done = true; },
            _ => self.prompt(format!("Unknown command '{}'", command)),
        }
    }

    fn prompt(&mut self, message: String) {
        self.state.prompts.push(message);
    }

    /// Creates a unit described by `text` as a child of the current unit.
    fn command_new(&mut self, text: &str) {
        if text.is_empty() {
            self.prompt("new needs some describing words".into());
            return;
        }
        let structure = TokenStructure::parse(text);
        let unit = Unit::new(vec![Representation::Text(structure.to_string())]);
        let id = self.graph.insert(unit);
        self.graph.link(self.state.current, id);
        self.prompt(format!("created {}: {}", id, structure));
    }

    /// Moves to the unit whose text representation matches `text`.
    fn command_enter(&mut self, text: &str) {
        let wanted = TokenStructure::parse(text).to_string();
        let matches: Vec<UnitId> = self.graph.ids().into_iter()
            .filter(|&id| {
                self.graph.get(id).is_some_and(|unit| {
                    unit.representations().iter().any(|rep| {
                        matches!(rep, Representation::Text(t) if *t == wanted)
                    })
                })
            })
            .collect();
        match matches.as_slice() {
            [] => self.prompt("Could not find a unit to enter".into()),
            [id] => {
                self.state.current = *id;
                info!("current unit is now {}", id);
            },
            many => self.prompt(format!(
                "Ambiguous: found {} units matching '{}'", many.len(), wanted,
            )),
        }
    }

    /// Moves to the current unit's first parent, if it has one.
    fn command_leave(&mut self) {
        let parent = self.graph.get(self.state.current)
            .and_then(|unit| unit.parents().first().copied());
        match parent {
            Some(parent) => { self.state.current = parent; },
            // Leaving the top is not an error worth reporting loudly.
            None => info!("ignoring leave at a top-level unit"),
        }
    }

    /// Binds a name in the global environment.
    fn command_bind(&mut self, rest: &str) {
        let (name, value) = match rest.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            self.prompt("bind needs a name".into());
            return;
        }
        self.environment.bind(name, value);
        self.prompt(format!("bound '{}'", name));
    }

    /// Attaches an expression representation to the current unit.
    fn command_define(&mut self, source: &str) {
        match reader::read(source) {
            Ok(expr) => {
                if let Some(unit) = self.graph.get(self.state.current) {
                    let unit = unit.clone().with_representation(Representation::Object(expr));
                    self.graph.replace(self.state.current, unit);
                }
            },
            Err(e) => self.prompt(format!("define: {}", e)),
        }
    }

    /// Attaches a text representation to the current unit.
    fn command_note(&mut self, text: &str) {
        if let Some(unit) = self.graph.get(self.state.current) {
            let structure = TokenStructure::parse(text);
            let unit = unit.clone()
                .with_representation(Representation::Text(structure.to_string()));
            self.graph.replace(self.state.current, unit);
        }
    }

    /// Reports whether the current unit is well-posed.
    fn command_check(&mut self) {
        let Some(unit) = self.graph.get(self.state.current) else { return; };
        match unit.is_well_posed(&self.environment) {
            Ok(true) => self.prompt("well defined".into()),
            Ok(false) => self.prompt("NOT well defined".into()),
            Err(e) => self.prompt(format!("check failed: {}", e)),
        }
    }

    /// Renders the current unit, its representations and its children.
    fn command_show(&mut self) {
        let mut out = String::new();
        let mut visited = HashSet::new();
        self.render(self.state.current, 0, &mut visited, &mut out);
        self.prompt(out);
    }

    fn render(&self, id: UnitId, indent: usize, visited: &mut HashSet<UnitId>, out: &mut String) {
        if !visited.insert(id) { return; }
        let Some(unit) = self.graph.get(id) else { return; };
        let pad = " ".repeat(indent);
        let _ = writeln!(out, "{}{}", pad, id);
        for rep in unit.representations() {
            let _ = writeln!(out, "{}  = {}", pad, rep);
        }
        for &child in unit.children() {
            self.render(child, indent + 4, visited, out);
        }
    }
}

// ----------------------------------------------------------------------------
