//! Scopes and variables handlers.
//! - handle_scopes: register group, plus segment/symbol browsing when a
//!   linker map is loaded
//! - handle_variables: materialize one scope's children

use zdb_z80::Reg;

use crate::protocol::{
    Request, Scope, ScopesArguments, ScopesResponseBody, Variable, VariablesArguments,
    VariablesResponseBody,
};

use super::super::util::format_hex;
use super::super::{DebugAdapter, DispatchOutcome};

const REF_REGISTERS: u32 = 100;
const REF_SEGMENTS: u32 = 200;
const REF_SYMBOLS: u32 = 300;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_scopes(
        &mut self,
        request: &Request,
        _args: &ScopesArguments,
    ) -> DispatchOutcome {
        let mut scopes = vec![Scope {
            name: "Registers".to_string(),
            variables_reference: REF_REGISTERS,
            presentation_hint: Some("registers".to_string()),
            expensive: false,
        }];
        if self.session().symbols.map.is_some() {
            scopes.push(Scope {
                name: "Segments".to_string(),
                variables_reference: REF_SEGMENTS,
                presentation_hint: None,
                expensive: false,
            });
            scopes.push(Scope {
                name: "Symbols".to_string(),
                variables_reference: REF_SYMBOLS,
                presentation_hint: None,
                expensive: true,
            });
        }

        let body = ScopesResponseBody { scopes };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_variables(
        &mut self,
        request: &Request,
        args: &VariablesArguments,
    ) -> DispatchOutcome {
        let variables = match args.variables_reference {
            REF_REGISTERS => self.register_variables(),
            REF_SEGMENTS => self.segment_variables(),
            REF_SYMBOLS => self.symbol_variables(),
            _ => Vec::new(),
        };

        let body = VariablesResponseBody { variables };
        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    fn register_variables(&self) -> Vec<Variable> {
        let cpu = self.session().cpu();
        let wide = [
            ("AF", Reg::AF),
            ("BC", Reg::BC),
            ("DE", Reg::DE),
            ("HL", Reg::HL),
            ("IX", Reg::IX),
            ("IY", Reg::IY),
            ("SP", Reg::SP),
            ("PC", Reg::PC),
        ];
        let mut variables: Vec<Variable> = wide
            .iter()
            .map(|(name, reg)| {
                let value = cpu.get_reg(*reg);
                Variable {
                    name: (*name).to_string(),
                    value: format_hex(value, 4),
                    variables_reference: 0,
                    memory_reference: matches!(reg, Reg::PC | Reg::SP)
                        .then(|| format_hex(value, 4)),
                }
            })
            .collect();
        for (name, reg) in [("I", Reg::I), ("R", Reg::R)] {
            variables.push(Variable {
                name: name.to_string(),
                value: format_hex(cpu.get_reg(reg), 2),
                variables_reference: 0,
                memory_reference: None,
            });
        }
        // F is the low byte of AF.
        variables.push(Variable {
            name: "F".to_string(),
            value: format_hex(cpu.get_reg(Reg::AF) & 0xFF, 2),
            variables_reference: 0,
            memory_reference: None,
        });
        variables
    }

    fn segment_variables(&self) -> Vec<Variable> {
        let Some(map) = self.session().symbols.map.as_ref() else {
            return Vec::new();
        };
        map.segments
            .iter()
            .map(|segment| Variable {
                name: segment.name.to_string(),
                value: format!(
                    "{} size 0x{:04X} ({})",
                    format_hex((segment.address & 0xFFFF) as u16, 4),
                    segment.size,
                    segment.attributes
                ),
                variables_reference: 0,
                memory_reference: Some(format_hex((segment.address & 0xFFFF) as u16, 4)),
            })
            .collect()
    }

    fn symbol_variables(&self) -> Vec<Variable> {
        let Some(map) = self.session().symbols.map.as_ref() else {
            return Vec::new();
        };
        map.symbols
            .iter()
            .filter(|symbol| !symbol.name.contains('$'))
            .map(|symbol| {
                let address = (symbol.address & 0xFFFF) as u16;
                Variable {
                    name: symbol.name.to_string(),
                    value: format_hex(address, 4),
                    variables_reference: 0,
                    memory_reference: Some(format_hex(address, 4)),
                }
            })
            .collect()
    }
}
