//! Signals yielded by conversation scripts
//!
//! Every suspension point of a script resolves to a [`Signal`]: a payload plus
//! an [`Intent`] telling the driver whether to keep going, pull the next queued
//! message, or stop until the next external trigger.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a script wants the driver to do after a suspension point resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Resume right away with the payload
    Continue,
    /// Resume with the next queued message, parking if there is none
    AwaitInput,
    /// Stop driving; resume with the payload on the next trigger
    Suspend,
    /// Stop driving; resume with the next queued message on the next trigger
    AwaitInputAndSuspend,
}

impl Intent {
    /// Map the `awaitInput` / `suspend` flag pair onto an intent
    pub fn from_flags(await_input: bool, suspend: bool) -> Self {
        match (await_input, suspend) {
            (false, false) => Intent::Continue,
            (true, false) => Intent::AwaitInput,
            (false, true) => Intent::Suspend,
            (true, true) => Intent::AwaitInputAndSuspend,
        }
    }

    pub fn awaits_input(self) -> bool {
        matches!(self, Intent::AwaitInput | Intent::AwaitInputAndSuspend)
    }

    pub fn suspends(self) -> bool {
        matches!(self, Intent::Suspend | Intent::AwaitInputAndSuspend)
    }
}

/// Resolved value of a script's suspension point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    value: Value,
    intent: Intent,
}

impl Signal {
    pub fn new(value: Value, intent: Intent) -> Self {
        Self { value, intent }
    }

    /// A plain result, the script resumes with `value`
    pub fn plain(value: impl Into<Value>) -> Self {
        Self::new(value.into(), Intent::Continue)
    }

    pub fn await_input(value: impl Into<Value>) -> Self {
        Self::new(value.into(), Intent::AwaitInput)
    }

    pub fn suspend(value: impl Into<Value>) -> Self {
        Self::new(value.into(), Intent::Suspend)
    }

    pub fn await_input_and_suspend(value: impl Into<Value>) -> Self {
        Self::new(value.into(), Intent::AwaitInputAndSuspend)
    }

    pub fn from_flags(value: impl Into<Value>, await_input: bool, suspend: bool) -> Self {
        Self::new(value.into(), Intent::from_flags(await_input, suspend))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn awaits_input(&self) -> bool {
        self.intent.awaits_input()
    }

    pub fn suspends(&self) -> bool {
        self.intent.suspends()
    }

    pub fn into_parts(self) -> (Value, Intent) {
        (self.value, self.intent)
    }
}

impl From<Value> for Signal {
    fn from(value: Value) -> Self {
        Signal::plain(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flags_map_to_intents() {
        assert_eq!(Intent::from_flags(false, false), Intent::Continue);
        assert_eq!(Intent::from_flags(true, false), Intent::AwaitInput);
        assert_eq!(Intent::from_flags(false, true), Intent::Suspend);
        assert_eq!(Intent::from_flags(true, true), Intent::AwaitInputAndSuspend);

        for await_input in [false, true] {
            for suspend in [false, true] {
                let intent = Intent::from_flags(await_input, suspend);
                assert_eq!(intent.awaits_input(), await_input);
                assert_eq!(intent.suspends(), suspend);
            }
        }
    }

    #[test]
    fn test_plain_value_is_continue() {
        let signal: Signal = json!({"foo": "bar"}).into();
        assert_eq!(signal.intent(), Intent::Continue);
        assert!(!signal.awaits_input());
        assert!(!signal.suspends());
        assert_eq!(signal.value(), &json!({"foo": "bar"}));
    }

    #[test]
    fn test_serialized_intent() {
        let signal = Signal::await_input_and_suspend("out");
        let encoded = serde_json::to_value(&signal).unwrap();
        assert_eq!(encoded, json!({"value": "out", "intent": "await_input_and_suspend"}));
    }
}
