use facade_runtime::{Map, Value};

/// Variable frames, innermost last. The bottom frame holds the values the
/// template was rendered with.
#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<Map>,
}

impl Scope {
    pub fn new(globals: Map) -> Self {
        Self {
            frames: vec![globals],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn push(&mut self) {
        self.frames.push(Map::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn declare(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    /// Overwrite the nearest binding of `name`, declaring it in the innermost
    /// frame when there is none.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.frames.iter_mut().rev().find(|frame| frame.contains_key(name)) {
            Some(frame) => {
                frame.insert(name.to_string(), value);
            }
            None => self.declare(name, value),
        }
    }

    /// Run `body` inside a fresh frame.
    pub fn scoped<T>(&mut self, body: impl FnOnce(&mut Scope) -> T) -> T {
        self.push();
        let result = body(self);
        self.pop();
        result
    }
}
