//! Board model: legs, physical pins and capability classes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// A physical role a pin can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityClass {
    DigitalInput,
    DigitalOutput,
    AnalogInput,
    AnalogOutput,
    /// Routed to a peripheral through an alternate-function selector.
    Alternate,
}

impl CapabilityClass {
    pub const ALL: [CapabilityClass; 5] = [
        CapabilityClass::DigitalInput,
        CapabilityClass::DigitalOutput,
        CapabilityClass::AnalogInput,
        CapabilityClass::AnalogOutput,
        CapabilityClass::Alternate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityClass::DigitalInput => "digital-input",
            CapabilityClass::DigitalOutput => "digital-output",
            CapabilityClass::AnalogInput => "analog-input",
            CapabilityClass::AnalogOutput => "analog-output",
            CapabilityClass::Alternate => "alternate",
        }
    }
}

impl fmt::Display for CapabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityClass {
    type Err = BoardError;

    /// Accepts kebab-case or snake_case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_ascii_lowercase();
        CapabilityClass::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| BoardError::UnknownClass(s.to_string()))
    }
}

/// A board-independent logical pin identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leg(pub String);

impl Leg {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Port and pin number of a physical pin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalPin {
    pub port: String,
    pub pin: u8,
}

impl fmt::Display for PhysicalPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port, self.pin)
    }
}

/// Physical resource a leg maps to on one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardBinding {
    /// Port identifier (e.g. "A", "E").
    pub port: String,
    /// Pin number within the port.
    pub pin: u8,
    /// Alternate-function selector, if the pin is routed to a peripheral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<u8>,
    /// Capability classes the pin supports.
    pub classes: BTreeSet<CapabilityClass>,
}

impl BoardBinding {
    pub fn new(port: impl Into<String>, pin: u8, classes: &[CapabilityClass]) -> Self {
        Self {
            port: port.into(),
            pin,
            alternate: None,
            classes: classes.iter().copied().collect(),
        }
    }

    pub fn with_alternate(mut self, selector: u8) -> Self {
        self.alternate = Some(selector);
        self.classes.insert(CapabilityClass::Alternate);
        self
    }

    pub fn physical(&self) -> PhysicalPin {
        PhysicalPin {
            port: self.port.clone(),
            pin: self.pin,
        }
    }

    pub fn supports(&self, class: CapabilityClass) -> bool {
        self.classes.contains(&class)
    }
}

/// A physical board: MCU family plus its complete leg table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Board {
    /// Board name (e.g., "stm32f3-discovery").
    pub name: String,
    /// MCU family tag selecting which driver headers are active.
    pub family: String,
    /// Short human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Leg table.
    #[serde(default)]
    pub legs: BTreeMap<Leg, BoardBinding>,
}

impl Board {
    pub fn new(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            description: None,
            legs: BTreeMap::new(),
        }
    }

    pub fn with_leg(mut self, leg: &str, binding: BoardBinding) -> Self {
        self.legs.insert(Leg::new(leg), binding);
        self
    }

    /// Look up a leg by name.
    pub fn binding(&self, leg: &str) -> Option<&BoardBinding> {
        self.legs.get(&Leg::new(leg))
    }

    /// STM32F3DISCOVERY: eight user LEDs on port E and the user button on PA0.
    pub fn stm32f3_discovery() -> Self {
        use CapabilityClass::*;
        let gpio = [DigitalInput, DigitalOutput];

        let mut board = Board::new("stm32f3-discovery", "stm32f3")
            .with_leg("USER_BUTTON", BoardBinding::new("A", 0, &[DigitalInput, AnalogInput]))
            .with_leg("ADC_IN2", BoardBinding::new("A", 1, &[DigitalInput, DigitalOutput, AnalogInput]))
            .with_leg("DAC_OUT1", BoardBinding::new("A", 4, &[DigitalInput, DigitalOutput, AnalogOutput]))
            .with_leg("USART1_TX", BoardBinding::new("C", 4, &gpio).with_alternate(7))
            .with_leg("USART1_RX", BoardBinding::new("C", 5, &gpio).with_alternate(7));
        // LD3..LD10 sit on PE8..PE15 in board-silkscreen order.
        for (led, pin) in [(4, 8), (3, 9), (5, 10), (7, 11), (9, 12), (10, 13), (8, 14), (6, 15)] {
            board = board.with_leg(&format!("LED{led}"), BoardBinding::new("E", pin, &gpio));
        }
        board.description = Some("STM32F3DISCOVERY (STM32F303VC)".into());
        board
    }

    /// NUCLEO-F303RE.
    pub fn nucleo_f303re() -> Self {
        use CapabilityClass::*;
        let gpio = [DigitalInput, DigitalOutput];

        let mut board = Board::new("nucleo-f303re", "stm32f3")
            .with_leg("LED2", BoardBinding::new("A", 5, &gpio))
            .with_leg("USER_BUTTON", BoardBinding::new("C", 13, &[DigitalInput]))
            .with_leg("A0", BoardBinding::new("A", 0, &[DigitalInput, DigitalOutput, AnalogInput]))
            .with_leg("A1", BoardBinding::new("A", 1, &[DigitalInput, DigitalOutput, AnalogInput]))
            .with_leg("USART2_TX", BoardBinding::new("A", 2, &gpio).with_alternate(7))
            .with_leg("USART2_RX", BoardBinding::new("A", 3, &gpio).with_alternate(7));
        board.description = Some("NUCLEO-F303RE (STM32F303RE)".into());
        board
    }
}
