//! Post-parse context resolution.
//!
//! The matched command trail is walked outermost first: a top-level action,
//! then optionally one of its object actions. Parameters of the innermost
//! command are loaded, list flags are decoded into the [`ValueStore`] and the
//! remaining values are written to the resolved object's instances.

use std::collections::BTreeSet;

use itertools::Itertools;
use strum_macros::Display;
use tracing::{Level, debug, enabled, trace, warn};

use crate::error::ModelError;
use crate::model::{CliModel, CommandOwner, Object, Target};
use crate::parser::{Application, CommandId, ParseContext};
use crate::store::ValueStore;
use crate::types::{Context, Param};

/// Resolution progress, in the order stages are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
enum Stage {
    Unresolved,
    ActionOnly,
    ActionWithObject,
    ActionWithObjectAndList,
    Resolved,
}

impl Stage {
    /// Move forward to `to`. Stages may be skipped but never revisited.
    fn advance(self, to: Stage) -> Stage {
        debug_assert!(to > self, "resolution cannot go from {self} back to {to}");
        trace!(event = "Resolve", phase = "Stage", from = %self, to = %to);
        to
    }
}

/// Decoded list instances, in decode order.
#[derive(Debug, Default)]
struct Decoded {
    /// `(object, list)` of every list flag that decoded a value.
    lists: Vec<(String, String)>,
    instances: Vec<(String, String)>,
}

impl Decoded {
    /// Distinct keys decoded for `object`.
    fn keys_of(&self, object: &str) -> Vec<&str> {
        self.instances
            .iter()
            .filter(|(o, _)| o == object)
            .map(|(_, key)| key.as_str())
            .unique()
            .collect()
    }

    /// Fields of `object` filled by the decoded lists.
    fn bound_fields<'o>(&self, object: &'o Object) -> BTreeSet<&'o str> {
        self.lists
            .iter()
            .filter(|(name, _)| name == object.name())
            .filter_map(|(_, list)| object.list(list))
            .flat_map(|list| list.fields().values().map(String::as_str))
            .collect()
    }
}

impl<A: Application> CliModel<A> {
    /// Parse `args` (without the program name) and resolve the outcome.
    pub fn parse(&mut self, args: &[String]) -> Result<&Context, ModelError> {
        self.finalize()?;
        self.reset();
        let ctx = self.app.parse(args).inspect_err(|err| {
            warn!(event = "Resolve", phase = "Parse", error = %err);
        })?;
        self.resolve(&ctx)
    }

    /// Resolve an already parsed context.
    ///
    /// The previous context and values are discarded. On error the context
    /// is left unresolved and the value store empty.
    pub fn resolve<C: ParseContext>(&mut self, ctx: &C) -> Result<&Context, ModelError> {
        self.finalize()?;
        self.reset();

        for flag in self.flags.values_mut() {
            flag.load_from(ctx);
        }

        let mut values = ValueStore::new();
        match self.resolve_trail(ctx, &mut values) {
            Ok(context) => {
                debug!(
                    event = "Resolve",
                    phase = %Stage::Resolved,
                    action = context.action(),
                    object = context.object(),
                    list = context.list()
                );
                if enabled!(Level::TRACE) {
                    trace!(
                        event = "Resolve",
                        phase = "Store",
                        values = serde_json::to_string(&values).unwrap_or_default()
                    );
                }
                self.context = context;
                self.values = values;
                Ok(&self.context)
            }
            Err(err) => {
                warn!(event = "Resolve", phase = "Failed", error = %err);
                Err(err)
            }
        }
    }

    /// Forget the context, values and loaded parameters of the last run.
    fn reset(&mut self) {
        self.context = Context::default();
        self.values = ValueStore::new();
        self.flags
            .values_mut()
            .chain(self.actions.values_mut().flat_map(|a| a.params.values_mut()))
            .chain(
                self.objects
                    .values_mut()
                    .flat_map(|o| o.actions.values_mut())
                    .flat_map(|oa| oa.params.values_mut()),
            )
            .for_each(Param::clear);
    }

    fn resolve_trail<C: ParseContext>(
        &mut self,
        ctx: &C,
        values: &mut ValueStore,
    ) -> Result<Context, ModelError> {
        let commands = ctx.selected_commands();
        let mut stage = Stage::Unresolved;
        let mut trail = Vec::with_capacity(commands.len());

        let Some(first) = commands.first() else {
            trace!(event = "Resolve", phase = %stage, "no command matched");
            return Ok(Context::resolved(None, None, None, trail));
        };
        let action = match self.commands.get(first) {
            Some(CommandOwner::Action(action)) => action.clone(),
            _ => return Err(ModelError::UnknownAction(unknown_command(*first))),
        };
        trail.push(action.clone());
        stage = stage.advance(Stage::ActionOnly);

        let mut object = None;
        if let Some(second) = commands.get(1) {
            match self.commands.get(second) {
                Some(CommandOwner::ObjectAction {
                    object: name,
                    action: owner,
                }) if *owner == action => {
                    trail.push(name.clone());
                    object = Some(name.clone());
                }
                Some(CommandOwner::ObjectAction { action: owner, .. }) => {
                    return Err(ModelError::UnknownAction(owner.clone()));
                }
                _ => return Err(ModelError::UnknownObject(unknown_command(*second))),
            }
            stage = stage.advance(Stage::ActionWithObject);
        }
        if commands.len() > 2 {
            warn!(
                event = "Resolve",
                phase = %stage,
                ignored = commands.len() - 2,
                "commands below the object level are not part of the model"
            );
        }

        if let Some(params) = self.actions.get_mut(&action).map(|a| &mut a.params) {
            params.values_mut().for_each(|p| p.load_from(ctx));
        }
        let target = match &object {
            Some(object) => Target::object_action(object, &action),
            None => Target::action_only(&action),
        };
        let params: Vec<Param> = {
            let params = self.target_params_mut(&target)?;
            params.values_mut().for_each(|p| p.load_from(ctx));
            params.values().cloned().collect()
        };

        let decoded = self.decode_lists(&params, values)?;
        let list = decoded.lists.first().cloned();
        if list.is_some() {
            stage = stage.advance(Stage::ActionWithObjectAndList);
            if object.is_none() {
                object = list.as_ref().map(|(object, _)| object.clone());
            }
        }

        if let Target::ObjectAction { object, action } = &target {
            self.write_plain_params(object, action, &params, &decoded, values)?;
        }
        write_details(&params, &decoded, values)?;
        stage = stage.advance(Stage::Resolved);
        trace!(event = "Resolve", phase = %stage, trail = ?trail);

        Ok(Context::resolved(
            Some(action),
            object,
            list.map(|(_, list)| list),
            trail,
        ))
    }

    /// Decode every list flag with a non-empty value into `values`.
    fn decode_lists(
        &self,
        params: &[Param],
        values: &mut ValueStore,
    ) -> Result<Decoded, ModelError> {
        let mut decoded = Decoded::default();
        for param in params {
            let (Some(list_ref), Some(raw)) = (param.list_ref(), param.raw_value()) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            let object = self
                .objects
                .get(&list_ref.object)
                .ok_or_else(|| ModelError::UnknownObject(list_ref.object.clone()))?;
            let list = object.list(&list_ref.list).ok_or_else(|| ModelError::UnknownList {
                object: list_ref.object.clone(),
                list: list_ref.list.clone(),
            })?;

            for instance in list.decode(object, raw)? {
                let record = values.record_mut(object.name(), &instance.key, &list_ref.action)?;
                for (attr, value) in instance.attrs {
                    record.set(&attr, value)?;
                }
                decoded
                    .instances
                    .push((object.name().to_string(), instance.key));
            }
            debug!(
                event = "Resolve",
                phase = "DecodeList",
                flag = param.name(),
                object = object.name(),
                list = list.name()
            );
            decoded
                .lists
                .push((object.name().to_string(), list.name().to_string()));
        }
        Ok(decoded)
    }

    /// Write the plain parameters of an object action under `object`.
    ///
    /// Decoded instances of the object all receive them, except key fields
    /// and fields the lists already filled. Without any decoded instance, one
    /// implicit instance is created, keyed by the first supplied key field or
    /// by the object name.
    fn write_plain_params(
        &self,
        object: &str,
        action: &str,
        params: &[Param],
        decoded: &Decoded,
        values: &mut ValueStore,
    ) -> Result<(), ModelError> {
        let plain: Vec<&Param> = params
            .iter()
            .filter(|p| !p.is_list() && p.detail_ref().is_none())
            .collect();

        let keys = decoded.keys_of(object);
        if !keys.is_empty() {
            let reserved: BTreeSet<&str> = match self.objects.get(object) {
                Some(declared) => decoded
                    .bound_fields(declared)
                    .into_iter()
                    .chain(declared.keys().iter().map(String::as_str))
                    .collect(),
                None => BTreeSet::new(),
            };
            for param in &plain {
                let Some(value) = param.value()? else {
                    continue;
                };
                if reserved.contains(param.name()) {
                    debug!(
                        event = "Resolve",
                        phase = "PlainParam",
                        object,
                        param = param.name(),
                        "field is set by the decoded list, value ignored"
                    );
                    continue;
                }
                for key in &keys {
                    values.update(object, key, param.name(), value.clone())?;
                }
            }
            return Ok(());
        }

        let key = self
            .objects
            .get(object)
            .and_then(|o| {
                o.keys().iter().find_map(|field| {
                    plain
                        .iter()
                        .find(|p| p.name() == field)
                        .and_then(|p| p.raw_value())
                        .filter(|v| !v.is_empty())
                })
            })
            .unwrap_or(object)
            .to_string();
        trace!(event = "Resolve", phase = "ImplicitInstance", object, key);

        let record = values.record_mut(object, &key, action)?;
        for param in &plain {
            if let Some(value) = param.value()? {
                record.set(param.name(), value)?;
            }
        }
        Ok(())
    }
}

/// Write detail flag values into the decoded instances of their object.
fn write_details(
    params: &[Param],
    decoded: &Decoded,
    values: &mut ValueStore,
) -> Result<(), ModelError> {
    for param in params {
        let Some(detail) = param.detail_ref() else {
            continue;
        };
        let Some(value) = param.value()? else {
            continue;
        };
        let mut applied = 0;
        for key in decoded.keys_of(&detail.object) {
            if values.update(&detail.object, key, &detail.field, value.clone())? {
                applied += 1;
            }
        }
        if applied == 0 {
            warn!(
                event = "Resolve",
                phase = "Detail",
                flag = param.name(),
                object = detail.object,
                "no decoded instance to apply the detail flag to"
            );
        }
    }
    Ok(())
}

fn unknown_command(cmd: CommandId) -> String {
    format!("command #{}", cmd.index())
}
