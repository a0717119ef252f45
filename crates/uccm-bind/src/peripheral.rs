//! Capability-indexed peripheral interface.
//!
//! A backend supplies the register-level translation for each capability
//! class a leg can be bound to. The binding table drives which accessors
//! are rendered; the backend decides what they expand to.

use std::fmt::Write;

use uccm_board::{CapabilityClass, Leg};

use crate::table::{BindingEntry, BindingTable};

/// File name of the rendered accessor header.
pub const LEGS_HEADER: &str = "uccm_legs.h";

pub trait DigitalInputOps {
    fn setup_input(&self, leg: &Leg, entry: &BindingEntry) -> String;
    fn get(&self, leg: &Leg, entry: &BindingEntry) -> String;
}

pub trait DigitalOutputOps {
    fn setup_output(&self, leg: &Leg, entry: &BindingEntry) -> String;
    fn set(&self, leg: &Leg, entry: &BindingEntry) -> String;
    fn toggle(&self, leg: &Leg, entry: &BindingEntry) -> String;
}

pub trait AnalogInputOps {
    fn setup_analog_input(&self, leg: &Leg, entry: &BindingEntry) -> String;
}

/// A family backend implementing every capability class it can drive.
pub trait PeripheralBackend: DigitalInputOps + DigitalOutputOps + AnalogInputOps + Send + Sync {
    fn name(&self) -> &'static str;

    /// Includes emitted once at the top of the header.
    fn preamble(&self, family: &str) -> String;

    /// Setup for classes without a dedicated accessor trait.
    fn setup_other(&self, leg: &Leg, entry: &BindingEntry) -> String;
}

/// Pick the backend for an MCU family.
pub fn backend_for_family(family: &str) -> Option<Box<dyn PeripheralBackend>> {
    if family.starts_with("stm32") {
        Some(Box::new(LlGpioBackend))
    } else {
        None
    }
}

/// Render the accessor header for every bound leg, in leg order.
pub fn render_legs_header(table: &BindingTable, backend: &dyn PeripheralBackend) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/* Generated by uccm for board {} ({}). */", table.board, table.family);
    out.push_str("#pragma once\n\n");
    out.push_str(&backend.preamble(&table.family));

    for (leg, entry) in &table.legs {
        out.push('\n');
        let _ = writeln!(out, "/* {leg}: P{}{} as {} */", entry.port, entry.pin, entry.class);
        match entry.class {
            CapabilityClass::DigitalInput => {
                out.push_str(&backend.setup_input(leg, entry));
                out.push_str(&backend.get(leg, entry));
            }
            CapabilityClass::DigitalOutput => {
                out.push_str(&backend.setup_output(leg, entry));
                out.push_str(&backend.set(leg, entry));
                out.push_str(&backend.toggle(leg, entry));
            }
            CapabilityClass::AnalogInput => {
                out.push_str(&backend.setup_analog_input(leg, entry));
            }
            CapabilityClass::AnalogOutput | CapabilityClass::Alternate => {
                out.push_str(&backend.setup_other(leg, entry));
            }
        }
    }
    out
}

/// STM32 low-layer GPIO backend (`stm32xxxx_ll_gpio.h`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LlGpioBackend;

impl LlGpioBackend {
    fn port(entry: &BindingEntry) -> String {
        format!("GPIO{}", entry.port)
    }

    fn pin(entry: &BindingEntry) -> String {
        format!("LL_GPIO_PIN_{}", entry.pin)
    }

    fn function(name: &str, leg: &Leg, ret: &str, args: &str, body: &[String]) -> String {
        let mut out = format!("static inline {ret} uccm_{name}_{leg}({args})\n{{\n");
        for line in body {
            let _ = writeln!(out, "    {line}");
        }
        out.push_str("}\n");
        out
    }

    fn mode(entry: &BindingEntry, mode: &str) -> String {
        format!(
            "LL_GPIO_SetPinMode({}, {}, LL_GPIO_MODE_{mode});",
            Self::port(entry),
            Self::pin(entry)
        )
    }

    fn output_type(entry: &BindingEntry) -> String {
        let kind = if entry.has_option("open-drain") {
            "OPENDRAIN"
        } else {
            "PUSHPULL"
        };
        format!(
            "LL_GPIO_SetPinOutputType({}, {}, LL_GPIO_OUTPUT_{kind});",
            Self::port(entry),
            Self::pin(entry)
        )
    }
}

impl DigitalInputOps for LlGpioBackend {
    fn setup_input(&self, leg: &Leg, entry: &BindingEntry) -> String {
        let pull = if entry.has_option("pull-up") {
            "UP"
        } else if entry.has_option("pull-down") {
            "DOWN"
        } else {
            "NO"
        };
        let body = vec![
            Self::mode(entry, "INPUT"),
            format!(
                "LL_GPIO_SetPinPull({}, {}, LL_GPIO_PULL_{pull});",
                Self::port(entry),
                Self::pin(entry)
            ),
        ];
        Self::function("setup", leg, "void", "void", &body)
    }

    fn get(&self, leg: &Leg, entry: &BindingEntry) -> String {
        let body = vec![format!(
            "return LL_GPIO_IsInputPinSet({}, {}) ? 1 : 0;",
            Self::port(entry),
            Self::pin(entry)
        )];
        Self::function("get", leg, "int", "void", &body)
    }
}

impl DigitalOutputOps for LlGpioBackend {
    fn setup_output(&self, leg: &Leg, entry: &BindingEntry) -> String {
        let body = vec![Self::mode(entry, "OUTPUT"), Self::output_type(entry)];
        Self::function("setup", leg, "void", "void", &body)
    }

    fn set(&self, leg: &Leg, entry: &BindingEntry) -> String {
        let (port, pin) = (Self::port(entry), Self::pin(entry));
        let body = vec![
            format!("if (val) LL_GPIO_SetOutputPin({port}, {pin});"),
            format!("else LL_GPIO_ResetOutputPin({port}, {pin});"),
        ];
        Self::function("set", leg, "void", "int val", &body)
    }

    fn toggle(&self, leg: &Leg, entry: &BindingEntry) -> String {
        let body = vec![format!(
            "LL_GPIO_TogglePin({}, {});",
            Self::port(entry),
            Self::pin(entry)
        )];
        Self::function("toggle", leg, "void", "void", &body)
    }
}

impl AnalogInputOps for LlGpioBackend {
    fn setup_analog_input(&self, leg: &Leg, entry: &BindingEntry) -> String {
        Self::function("setup", leg, "void", "void", &[Self::mode(entry, "ANALOG")])
    }
}

impl PeripheralBackend for LlGpioBackend {
    fn name(&self) -> &'static str {
        "ll-gpio"
    }

    fn preamble(&self, family: &str) -> String {
        format!("#include \"{family}xx_ll_gpio.h\"\n")
    }

    fn setup_other(&self, leg: &Leg, entry: &BindingEntry) -> String {
        match entry.class {
            CapabilityClass::Alternate => {
                let mut body = vec![Self::mode(entry, "ALTERNATE"), Self::output_type(entry)];
                if let Some(af) = entry.alternate {
                    let (port, pin) = (Self::port(entry), Self::pin(entry));
                    let bank = if entry.pin < 8 { "0_7" } else { "8_15" };
                    body.push(format!("LL_GPIO_SetAFPin_{bank}({port}, {pin}, LL_GPIO_AF_{af});"));
                }
                Self::function("setup", leg, "void", "void", &body)
            }
            // DAC outputs are driven from an analog-mode pin.
            CapabilityClass::AnalogOutput => {
                Self::function("setup", leg, "void", "void", &[Self::mode(entry, "ANALOG")])
            }
            CapabilityClass::DigitalInput => self.setup_input(leg, entry),
            CapabilityClass::DigitalOutput => self.setup_output(leg, entry),
            CapabilityClass::AnalogInput => self.setup_analog_input(leg, entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Claimant;

    fn entry(port: &str, pin: u8, class: CapabilityClass, options: &[&str]) -> BindingEntry {
        BindingEntry {
            port: port.into(),
            pin,
            alternate: None,
            class,
            options: options.iter().map(|o| o.to_string()).collect(),
            claimants: vec![Claimant {
                header: "app.h".into(),
                capability: "gpio".into(),
                origin: "app.h:1".into(),
            }],
        }
    }

    #[test]
    fn output_leg_accessors() {
        let mut table = BindingTable::new("stm32f3-discovery", "stm32f3");
        table.legs.insert(
            Leg::new("LED3"),
            entry("E", 9, CapabilityClass::DigitalOutput, &[]),
        );
        let header = render_legs_header(&table, &LlGpioBackend);

        assert!(header.starts_with("/* Generated by uccm for board stm32f3-discovery (stm32f3). */\n#pragma once\n"));
        assert!(header.contains("#include \"stm32f3xx_ll_gpio.h\""));
        assert!(header.contains("static inline void uccm_setup_LED3(void)"));
        assert!(header.contains("LL_GPIO_SetPinMode(GPIOE, LL_GPIO_PIN_9, LL_GPIO_MODE_OUTPUT);"));
        assert!(header.contains("LL_GPIO_OUTPUT_PUSHPULL"));
        assert!(header.contains("static inline void uccm_set_LED3(int val)"));
        assert!(header.contains("LL_GPIO_TogglePin(GPIOE, LL_GPIO_PIN_9);"));
        assert!(!header.contains("uccm_get_LED3"));
    }

    #[test]
    fn input_pull_and_analog() {
        let mut table = BindingTable::new("b", "stm32f3");
        table.legs.insert(
            Leg::new("BTN"),
            entry("A", 0, CapabilityClass::DigitalInput, &["pull-down"]),
        );
        table
            .legs
            .insert(Leg::new("POT"), entry("A", 1, CapabilityClass::AnalogInput, &[]));
        let header = render_legs_header(&table, &LlGpioBackend);
        assert!(header.contains("LL_GPIO_PULL_DOWN"));
        assert!(header.contains("static inline int uccm_get_BTN(void)"));
        assert!(header.contains("LL_GPIO_SetPinMode(GPIOA, LL_GPIO_PIN_1, LL_GPIO_MODE_ANALOG);"));
    }

    #[test]
    fn alternate_function_bank() {
        let mut tx = entry("C", 4, CapabilityClass::Alternate, &[]);
        tx.alternate = Some(7);
        let out = LlGpioBackend.setup_other(&Leg::new("TX"), &tx);
        assert!(out.contains("LL_GPIO_SetAFPin_0_7(GPIOC, LL_GPIO_PIN_4, LL_GPIO_AF_7);"));
    }

    #[test]
    fn alternate_mode_never_falls_back_to_analog() {
        let tx = entry("A", 9, CapabilityClass::Alternate, &[]);
        let out = LlGpioBackend.setup_other(&Leg::new("TX"), &tx);
        assert!(out.contains("LL_GPIO_SetPinMode(GPIOA, LL_GPIO_PIN_9, LL_GPIO_MODE_ALTERNATE);"));
        assert!(!out.contains("MODE_ANALOG"));
        assert!(!out.contains("SetAFPin"));

        let dac = entry("A", 4, CapabilityClass::AnalogOutput, &[]);
        let out = LlGpioBackend.setup_other(&Leg::new("DAC"), &dac);
        assert!(out.contains("LL_GPIO_MODE_ANALOG"));
    }

    #[test]
    fn backend_selection() {
        assert_eq!(backend_for_family("stm32f3").map(|b| b.name()), Some("ll-gpio"));
        assert!(backend_for_family("nrf52").is_none());
    }
}
