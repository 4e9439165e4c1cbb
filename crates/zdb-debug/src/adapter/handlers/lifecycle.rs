//! Session lifecycle handlers.
//! - handle_launch: reset, load the image and its symbol tables
//! - handle_configuration_done: consume the deferred entry stop
//! - handle_disconnect: clear `launched` and end the connection loop

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::{info, warn};

use zdb_sdcc::{CdbParser, MapParser};

use crate::image::{companion_path, load_program};
use crate::protocol::{DisconnectArguments, LaunchArguments, Request};

use super::super::{DebugAdapter, DispatchOutcome};

impl DebugAdapter {
    pub(in crate::adapter) fn handle_launch(
        &mut self,
        request: &Request,
        args: &LaunchArguments,
    ) -> DispatchOutcome {
        let session = self.session_mut();
        session.reset_for_launch();

        if let Some(program) = args.program.as_deref() {
            let program = PathBuf::from(program);
            match load_program(&program, session.memory_mut()) {
                Ok(image) => {
                    info!(
                        program = %program.display(),
                        entry = image.entry,
                        bytes = image.loaded,
                        "program image loaded"
                    );
                    session.set_pc(image.entry);
                }
                Err(err) => {
                    // Degraded mode: an empty address space, still
                    // debuggable by hand.
                    warn!(error = %err, "program image not loaded");
                }
            }

            if args.no_debug {
                info!("noDebug set, skipping symbol tables");
            } else {
                load_symbol_tables(self, args, &program);
            }
            let session = self.session_mut();
            session.set_program_path(program.clone());
            if let Some(parent) = program.parent() {
                session.symbols.source_roots.push(parent.to_path_buf());
            }
            for root in &args.source_roots {
                session.symbols.source_roots.push(PathBuf::from(root));
            }
        }

        let session = self.session_mut();
        session.rebuild_resolved_breakpoints();
        session.set_launched(true);
        session.set_pending_entry_stop();

        DispatchOutcome {
            responses: vec![self.ok_response(request, Some(json!({})))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_configuration_done(
        &mut self,
        request: &Request,
    ) -> DispatchOutcome {
        let response = self.ok_response(request, Some(json!({})));
        let mut events = Vec::new();
        if self.session_mut().take_pending_entry_stop() {
            events.push(self.stopped_event("entry"));
        }
        DispatchOutcome {
            responses: vec![response],
            events,
            should_exit: false,
        }
    }

    pub(in crate::adapter) fn handle_disconnect(
        &mut self,
        request: &Request,
        _args: &DisconnectArguments,
    ) -> DispatchOutcome {
        self.session_mut().set_launched(false);
        info!("client disconnected");
        DispatchOutcome {
            responses: vec![self.ok_response::<Value>(request, None)],
            events: Vec::new(),
            should_exit: true,
        }
    }
}

/// Loads the companion CDB and MAP tables, by explicit argument or by
/// extension convention next to the image. Missing or unparseable tables
/// are logged and skipped; debugging proceeds address-only.
fn load_symbol_tables(adapter: &mut DebugAdapter, args: &LaunchArguments, program: &Path) {
    let cdb_path = args
        .cdb_file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| companion_path(program, "cdb"));
    match CdbParser::new().parse(&cdb_path) {
        Some(modules) => {
            info!(path = %cdb_path.display(), modules = modules.len(), "debug info loaded");
            adapter.session_mut().symbols.debug_info = Some(modules);
        }
        None => warn!(path = %cdb_path.display(), "no debug info"),
    }

    let map_path = args
        .map_file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| companion_path(program, "map"));
    match MapParser::new().parse(&map_path) {
        Some(map) => {
            info!(
                path = %map_path.display(),
                segments = map.segments.len(),
                symbols = map.symbols.len(),
                "linker map loaded"
            );
            adapter.session_mut().symbols.map = Some(map);
        }
        None => warn!(path = %map_path.display(), "no linker map"),
    }
}
