//! Command and query execution against a canvas.
//!
//! A [`Session`] stands in for both the application and the hosting
//! widget: it owns the canvas, a recording host, the names scripts give to
//! items, and a log of every event the item handlers saw.

use crate::{
    Command, CommandResult, DrawOp, EventRecord, ExtentsInfo, HostInfo, ItemInfo, ItemKind,
    ItemQuery, Query, QueryResult, RectShape, Target, TreeNode, ViewportInfo,
};
use anyhow::{anyhow, bail, Context, Result};
use canvas_core::{Bounds, PixelRect, Region};
use glam::DVec2;
use scene_graph::{
    Canvas, CanvasConfig, CanvasEvent, Clip, EventKind, EventMask, ItemFlags, ItemId,
    ModifierState, Painter, RecordingHost, Rgba,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The name scripts use for the root group.
pub const ROOT_NAME: &str = "root";

/// Window and canvas settings for a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(flatten)]
    pub canvas: CanvasConfig,
    /// Window width in pixels.
    pub width: i32,
    /// Window height in pixels.
    pub height: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            width: 100,
            height: 100,
        }
    }
}

/// A mapped canvas driven by commands.
pub struct Session {
    canvas: Canvas,
    host: RecordingHost,
    names: HashMap<String, ItemId>,
    ids: HashMap<ItemId, String>,
    events: Rc<RefCell<Vec<EventRecord>>>,
    /// Pointer buttons currently held.
    buttons: ModifierState,
    frame: Vec<DrawOp>,
}

impl Session {
    /// Creates the canvas, allocates and maps its window, and runs the
    /// first update pass.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let host = RecordingHost::new();
        let mut canvas = Canvas::with_config(config.canvas, host.clone())
            .context("invalid canvas configuration")?;
        canvas.size_allocate(config.width, config.height);
        canvas.map();
        canvas.run_idle();

        let mut session = Self {
            canvas,
            host,
            names: HashMap::new(),
            ids: HashMap::new(),
            events: Rc::default(),
            buttons: ModifierState::empty(),
            frame: Vec::new(),
        };
        let root = session.canvas.root();
        session.register(ROOT_NAME.to_owned(), root, Vec::new())?;
        log::debug!("session started with a {}x{} window", config.width, config.height);
        Ok(session)
    }

    /// Executes a command, reporting failures as an error result.
    pub fn execute(&mut self, command: Command) -> CommandResult {
        log::trace!("executing {command:?}");
        match self.execute_inner(command) {
            Ok(result) => result,
            Err(err) => {
                log::warn!("command failed: {err:#}");
                CommandResult::error(format!("{err:#}"))
            }
        }
    }

    /// Runs a query, reporting failures as an error result.
    pub fn query(&self, query: Query) -> QueryResult {
        match self.query_inner(query) {
            Ok(result) => result,
            Err(err) => QueryResult::Error {
                message: format!("{err:#}"),
            },
        }
    }

    fn execute_inner(&mut self, command: Command) -> Result<CommandResult> {
        match command {
            Command::CreateGroup {
                name,
                parent,
                offset,
                consumes,
            } => {
                let parent = self.resolve_one(&parent)?;
                self.check_name_free(&name)?;
                let id = self
                    .canvas
                    .create_group(parent, offset)
                    .with_context(|| format!("creating group {name:?}"))?;
                self.register(name.clone(), id, consumes)?;
                Ok(CommandResult::created(vec![name]))
            }

            Command::CreateRect {
                name,
                parent,
                position,
                size,
                fill,
                outline,
                outline_width,
                consumes,
            } => {
                let parent = self.resolve_one(&parent)?;
                self.check_name_free(&name)?;

                let mut shape = RectShape::new(Bounds::from_origin_size(position, size));
                shape.fill = fill;
                shape.outline = outline;
                if let Some(width) = outline_width {
                    shape.outline_width = width;
                }

                let id = self
                    .canvas
                    .create_item(parent, shape)
                    .with_context(|| format!("creating rectangle {name:?}"))?;
                self.register(name.clone(), id, consumes)?;
                Ok(CommandResult::created(vec![name]))
            }

            Command::Destroy { target } => {
                for id in self.resolve(&target)? {
                    // Already gone with a destroyed ancestor
                    if !self.canvas.contains(id) {
                        continue;
                    }
                    let name = self.name_of(id);
                    self.canvas
                        .destroy(id)
                        .with_context(|| format!("destroying {name:?}"))?;
                }
                Ok(CommandResult::deleted(self.forget_destroyed()))
            }

            Command::SetStyle {
                target,
                fill,
                outline,
                outline_width,
            } => {
                let mut modified = Vec::new();
                for id in self.resolve(&target)? {
                    let name = self.name_of(id);
                    self.canvas
                        .set_properties::<RectShape, _>(id, |shape| {
                            if fill.is_some() {
                                shape.fill = fill;
                            }
                            if outline.is_some() {
                                shape.outline = outline;
                            }
                            if let Some(width) = outline_width {
                                shape.outline_width = width;
                            }
                        })
                        .with_context(|| format!("styling {name:?}"))?;
                    modified.push(name);
                }
                Ok(CommandResult::modified(modified))
            }

            Command::Move { target, delta } => {
                self.for_each(&target, "moving", |canvas, id| canvas.move_item(id, delta))
            }

            Command::SetOffset { target, offset } => {
                self.for_each(&target, "offsetting", |canvas, id| {
                    canvas.set_group_offset(id, offset)
                })
            }

            Command::Show { target } => self.for_each(&target, "showing", Canvas::show),

            Command::Hide { target } => self.for_each(&target, "hiding", Canvas::hide),

            Command::Reparent { target, group } => {
                let group = self.resolve_one(&group)?;
                let group_name = self.name_of(group);
                self.for_each(&target, "reparenting", |canvas, id| canvas.reparent(id, group))
                    .with_context(|| format!("into {group_name:?}"))
            }

            Command::Raise { target, positions } => {
                self.restack(&target, |canvas, id| canvas.raise(id, positions))
            }

            Command::Lower { target, positions } => {
                self.restack(&target, |canvas, id| canvas.lower(id, positions))
            }

            Command::RaiseToTop { target } => self.restack(&target, Canvas::raise_to_top),

            Command::LowerToBottom { target } => self.restack(&target, Canvas::lower_to_bottom),

            Command::SendBehind { target, behind } => {
                let behind = behind.map(|behind| self.resolve_one(&behind)).transpose()?;
                self.restack(&target, |canvas, id| canvas.send_behind(id, behind))
            }

            Command::Grab {
                target,
                events,
                cursor,
                time,
            } => {
                let id = self.resolve_one(&target)?;
                let name = self.name_of(id);
                let mask = events
                    .iter()
                    .fold(EventMask::empty(), |mask, kind| mask | kind.mask());
                self.canvas
                    .grab(id, mask, cursor.as_deref(), time)
                    .with_context(|| format!("grabbing the pointer for {name:?}"))?;
                Ok(CommandResult::modified(vec![name]))
            }

            Command::Ungrab { target, time } => {
                let ids = self.resolve(&target)?;
                for &id in &ids {
                    self.canvas.ungrab(id, time);
                }
                Ok(CommandResult::modified(self.names_of(&ids)))
            }

            Command::Focus { target } => {
                let id = self.resolve_one(&target)?;
                let name = self.name_of(id);
                self.canvas
                    .grab_focus(id)
                    .with_context(|| format!("focusing {name:?}"))?;
                Ok(CommandResult::modified(vec![name]))
            }

            Command::MapWindow => {
                self.canvas.map();
                Ok(CommandResult::success())
            }

            Command::UnmapWindow => {
                self.canvas.unmap();
                Ok(CommandResult::success())
            }

            Command::Resize { width, height } => {
                if width < 0 || height < 0 {
                    bail!("window size {width}x{height} is negative");
                }
                self.canvas.size_allocate(width, height);
                Ok(CommandResult::success())
            }

            Command::SetScrollRegion { region } => {
                self.canvas.set_scroll_region(region);
                Ok(CommandResult::success())
            }

            Command::ScrollTo { x, y } => {
                self.canvas.scroll_to(x, y);
                Ok(CommandResult::success())
            }

            Command::SetPixelsPerUnit { pixels_per_unit } => {
                self.canvas.set_pixels_per_unit(pixels_per_unit)?;
                Ok(CommandResult::success())
            }

            Command::SetCenterScrollRegion { center } => {
                self.canvas.set_center_scroll_region(center);
                Ok(CommandResult::success())
            }

            Command::SetCloseEnough { pixels } => {
                self.canvas.set_close_enough(pixels);
                Ok(CommandResult::success())
            }

            Command::RunIdle => {
                self.canvas.run_idle();
                Ok(CommandResult::success())
            }

            Command::UpdateNow => {
                self.canvas.update_now();
                Ok(CommandResult::success())
            }

            Command::Draw { clip } => {
                let clip = match clip {
                    Some(rects) => Clip::Rects(rects),
                    None => Clip::rect(self.visible_area()),
                };
                let mut recorder = FrameRecorder::default();
                self.canvas.draw(&mut recorder, &clip);
                self.frame = recorder.ops;
                Ok(CommandResult::success())
            }

            Command::Motion { x, y, time } => {
                let event = CanvasEvent::motion(DVec2::new(x, y), self.buttons).with_time(time);
                Ok(CommandResult::handled(self.canvas.handle_motion(&event)))
            }

            Command::ButtonPress { x, y, button, time } => {
                let event = CanvasEvent::button_press(DVec2::new(x, y), button, self.buttons)
                    .with_time(time);
                let handled = self.canvas.handle_button(&event);
                self.buttons.insert(ModifierState::for_button(button));
                Ok(CommandResult::handled(handled))
            }

            Command::ButtonRelease { x, y, button, time } => {
                let event = CanvasEvent::button_release(DVec2::new(x, y), button, self.buttons)
                    .with_time(time);
                let handled = self.canvas.handle_button(&event);
                self.buttons.remove(ModifierState::for_button(button));
                Ok(CommandResult::handled(handled))
            }

            Command::KeyPress { key, time } => {
                let event = CanvasEvent::key_press(key, self.buttons).with_time(time);
                Ok(CommandResult::handled(self.canvas.handle_key(&event)))
            }

            Command::KeyRelease { key, time } => {
                let event = CanvasEvent::key_release(key, self.buttons).with_time(time);
                Ok(CommandResult::handled(self.canvas.handle_key(&event)))
            }

            Command::PointerEnter { x, y } => {
                let event = CanvasEvent {
                    state: self.buttons,
                    ..CanvasEvent::enter(DVec2::new(x, y))
                };
                Ok(CommandResult::handled(self.canvas.handle_crossing(&event)))
            }

            Command::PointerLeave { x, y } => {
                let event = CanvasEvent {
                    state: self.buttons,
                    ..CanvasEvent::leave(DVec2::new(x, y))
                };
                Ok(CommandResult::handled(self.canvas.handle_crossing(&event)))
            }

            Command::WindowFocusIn => Ok(CommandResult::handled(self.canvas.handle_focus_in())),

            Command::WindowFocusOut => Ok(CommandResult::handled(self.canvas.handle_focus_out())),

            Command::Batch { commands } => {
                let mut all_created = Vec::new();
                let mut all_modified = Vec::new();
                let mut all_deleted = Vec::new();
                let mut any_handled = None;

                for cmd in commands {
                    match self.execute_inner(cmd).context("batch failed")? {
                        CommandResult::Success {
                            created,
                            modified,
                            deleted,
                            handled,
                        } => {
                            all_created.extend(created);
                            all_modified.extend(modified);
                            all_deleted.extend(deleted);
                            if let Some(handled) = handled {
                                any_handled = Some(any_handled.unwrap_or(false) || handled);
                            }
                        }
                        CommandResult::Error { message } => {
                            bail!("batch failed: {message}");
                        }
                    }
                }

                Ok(CommandResult::Success {
                    created: all_created,
                    modified: all_modified,
                    deleted: all_deleted,
                    handled: any_handled,
                })
            }
        }
    }

    fn query_inner(&self, query: Query) -> Result<QueryResult> {
        match query {
            Query::GetTree => Ok(QueryResult::Tree {
                root: self.tree_node(self.canvas.root())?,
            }),

            Query::GetItems { target } => {
                let items = self
                    .resolve(&target)?
                    .into_iter()
                    .map(|id| self.item_info(id))
                    .collect::<Result<_>>()?;
                Ok(QueryResult::Items { items })
            }

            Query::GetItemAt { x, y } => Ok(QueryResult::Item {
                name: self.canvas.item_at(DVec2::new(x, y)).map(|id| self.name_of(id)),
            }),

            Query::GetExtents { target } => {
                let mut extents = Vec::new();
                for id in self.resolve(&target)? {
                    extents.push(ExtentsInfo {
                        name: self.name_of(id),
                        rect: self.canvas.item_extents(id)?,
                        on_screen: self.canvas.is_item_on_screen(id)?,
                    });
                }
                Ok(QueryResult::Extents { extents })
            }

            Query::GetViewport => {
                let viewport = self.canvas.viewport();
                Ok(QueryResult::Viewport(ViewportInfo {
                    scroll_region: viewport.scroll_region(),
                    pixels_per_unit: viewport.pixels_per_unit(),
                    center_scroll_region: viewport.center_scroll_region(),
                    scroll_offsets: viewport.scroll_offsets(),
                    zoom_offset: viewport.zoom_offset(),
                    allocation: viewport.allocation(),
                }))
            }

            Query::GetPick => Ok(QueryResult::Pick {
                current: self.canvas.current_item().map(|id| self.name_of(id)),
                grabbed: self.canvas.grabbed_item().map(|id| self.name_of(id)),
                focused: self.canvas.focused_item().map(|id| self.name_of(id)),
            }),

            Query::GetEvents => Ok(QueryResult::Events {
                events: self.events.borrow().clone(),
            }),

            Query::GetDamage => Ok(QueryResult::Damage {
                rects: self.canvas.pending_damage().rects().to_vec(),
            }),

            Query::GetFrame => Ok(QueryResult::Frame {
                ops: self.frame.clone(),
            }),

            Query::GetHost => {
                let log = self.host.log();
                Ok(QueryResult::Host(HostInfo {
                    updates_scheduled: log.updates_scheduled,
                    updates_cancelled: log.updates_cancelled,
                    repaints_queued: log.repaints_queued,
                    resizes_queued: log.resizes_queued,
                    pointer_grabs: log.pointer_grabs.len(),
                    pointer_ungrabs: log.pointer_ungrabs,
                    focus_grabs: log.focus_grabs,
                }))
            }

            Query::GetItemCount => Ok(QueryResult::Count {
                count: self.canvas.item_count(),
            }),
        }
    }

    /// Names an item and connects the handler that feeds the event log.
    fn register(&mut self, name: String, id: ItemId, consumes: Vec<EventKind>) -> Result<()> {
        let events = Rc::clone(&self.events);
        let item = name.clone();
        self.canvas.connect_event(id, move |_canvas, _id, event| {
            events.borrow_mut().push(EventRecord {
                item: item.clone(),
                kind: event.kind,
                position: event.position,
                button: event.button,
                key: event.key,
            });
            consumes.contains(&event.kind)
        })?;
        self.names.insert(name.clone(), id);
        self.ids.insert(id, name);
        Ok(())
    }

    fn check_name_free(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            bail!("item names cannot be empty");
        }
        if self.names.contains_key(name) {
            bail!("an item named {name:?} already exists");
        }
        Ok(())
    }

    /// Drops the names of destroyed items, returning them.
    fn forget_destroyed(&mut self) -> Vec<String> {
        let mut gone: Vec<String> = self
            .names
            .iter()
            .filter(|(_, &id)| !self.canvas.contains(id))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &gone {
            if let Some(id) = self.names.remove(name) {
                self.ids.remove(&id);
            }
        }
        gone.sort();
        gone
    }

    fn for_each(
        &mut self,
        target: &Target,
        action: &str,
        mut f: impl FnMut(&mut Canvas, ItemId) -> Result<(), scene_graph::SceneError>,
    ) -> Result<CommandResult> {
        let ids = self.resolve(target)?;
        for &id in &ids {
            f(&mut self.canvas, id).with_context(|| format!("{action} {:?}", self.name_of(id)))?;
        }
        Ok(CommandResult::modified(self.names_of(&ids)))
    }

    /// Applies a stacking change, reporting only the items that moved.
    fn restack(
        &mut self,
        target: &Target,
        mut f: impl FnMut(&mut Canvas, ItemId) -> Result<bool, scene_graph::SceneError>,
    ) -> Result<CommandResult> {
        let mut modified = Vec::new();
        for id in self.resolve(target)? {
            let name = self.name_of(id);
            if f(&mut self.canvas, id).with_context(|| format!("restacking {name:?}"))? {
                modified.push(name);
            }
        }
        Ok(CommandResult::modified(modified))
    }

    fn resolve(&self, target: &Target) -> Result<Vec<ItemId>> {
        match target {
            Target::Root => Ok(vec![self.canvas.root()]),
            Target::Item(name) => Ok(vec![self.lookup(name)?]),
            Target::Items(names) => names.iter().map(|name| self.lookup(name)).collect(),
            Target::Current => Ok(self.canvas.current_item().into_iter().collect()),
            Target::Grabbed => Ok(self.canvas.grabbed_item().into_iter().collect()),
            Target::Focused => Ok(self.canvas.focused_item().into_iter().collect()),
            Target::Query(query) => self.resolve_query(query),
        }
    }

    fn resolve_query(&self, query: &ItemQuery) -> Result<Vec<ItemId>> {
        match query {
            ItemQuery::At { x, y } => {
                Ok(self.canvas.item_at(DVec2::new(*x, *y)).into_iter().collect())
            }
            ItemQuery::ChildrenOf(target) => {
                let mut children = Vec::new();
                for id in self.resolve(target)? {
                    children.extend_from_slice(self.canvas.children(id)?);
                }
                Ok(children)
            }
            ItemQuery::ParentOf(target) => {
                let mut parents = Vec::new();
                for id in self.resolve(target)? {
                    if let Some(parent) = self.canvas.parent(id)? {
                        if !parents.contains(&parent) {
                            parents.push(parent);
                        }
                    }
                }
                Ok(parents)
            }
        }
    }

    fn resolve_one(&self, target: &Target) -> Result<ItemId> {
        match self.resolve(target)?.as_slice() {
            [id] => Ok(*id),
            [] => bail!("{target:?} matches no item"),
            ids => bail!("{target:?} matches {} items, expected one", ids.len()),
        }
    }

    fn lookup(&self, name: &str) -> Result<ItemId> {
        self.names
            .get(name)
            .copied()
            .filter(|&id| self.canvas.contains(id))
            .ok_or_else(|| anyhow!("no item named {name:?}"))
    }

    fn name_of(&self, id: ItemId) -> String {
        self.ids.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn names_of(&self, ids: &[ItemId]) -> Vec<String> {
        ids.iter().map(|&id| self.name_of(id)).collect()
    }

    fn item_info(&self, id: ItemId) -> Result<ItemInfo> {
        let flags = self.canvas.flags(id)?;
        let is_group = self.canvas.is_group(id)?;
        let kind = if is_group {
            ItemKind::Group
        } else if self.canvas.item::<RectShape>(id).is_some() {
            ItemKind::Rect
        } else {
            ItemKind::Other
        };
        Ok(ItemInfo {
            name: self.name_of(id),
            kind,
            parent: self.canvas.parent(id)?.map(|parent| self.name_of(parent)),
            z_index: self.canvas.z_index(id)?,
            visible: flags.contains(ItemFlags::VISIBLE),
            realized: flags.contains(ItemFlags::REALIZED),
            mapped: flags.contains(ItemFlags::MAPPED),
            bounds: self.canvas.get_bounds(id)?,
            pixel_bounds: self.canvas.pixel_bounds(id)?,
            offset: if is_group {
                Some(self.canvas.group_offset(id)?)
            } else {
                None
            },
        })
    }

    fn tree_node(&self, id: ItemId) -> Result<TreeNode> {
        let children = self
            .canvas
            .children(id)?
            .iter()
            .map(|&child| self.tree_node(child))
            .collect::<Result<_>>()?;
        Ok(TreeNode {
            info: self.item_info(id)?,
            children,
        })
    }

    /// The part of the canvas inside the window, in canvas pixels.
    fn visible_area(&self) -> PixelRect {
        let origin = self.canvas.scroll_offsets();
        let size = self.canvas.viewport().allocation();
        PixelRect::from_origin_size(origin.x, origin.y, size.x, size.y)
    }
}

/// A painter that keeps its calls for [`Query::GetFrame`].
#[derive(Default)]
struct FrameRecorder {
    ops: Vec<DrawOp>,
}

impl Painter for FrameRecorder {
    fn draw_background(&mut self, region: &Region) {
        self.ops.push(DrawOp::Background {
            rects: region.rects().to_vec(),
        });
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        self.ops.push(DrawOp::Fill { rect, color });
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba, width: f64) {
        self.ops.push(DrawOp::Stroke { rect, color, width });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionConfig::default()).unwrap()
    }

    fn rect(name: &str, parent: Target, x: f64, y: f64, w: f64, h: f64) -> Command {
        Command::CreateRect {
            name: name.into(),
            parent,
            position: DVec2::new(x, y),
            size: DVec2::new(w, h),
            fill: Some(Rgba::BLACK),
            outline: None,
            outline_width: None,
            consumes: vec![],
        }
    }

    fn group(name: &str, offset: DVec2) -> Command {
        Command::CreateGroup {
            name: name.into(),
            parent: Target::Root,
            offset,
            consumes: vec![],
        }
    }

    fn events(session: &Session) -> Vec<(String, EventKind)> {
        match session.query(Query::GetEvents) {
            QueryResult::Events { events } => {
                events.into_iter().map(|event| (event.item, event.kind)).collect()
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    fn item_at(session: &Session, x: f64, y: f64) -> Option<String> {
        match session.query(Query::GetItemAt { x, y }) {
            QueryResult::Item { name } => name,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_create_and_query_tree() {
        let mut session = session();
        assert!(session.execute(group("g", DVec2::new(10.0, 10.0))).is_success());
        assert_eq!(
            session.execute(rect("a", Target::from("g"), 0.0, 0.0, 20.0, 20.0)),
            CommandResult::created(vec!["a".into()])
        );
        session.execute(Command::RunIdle);

        let QueryResult::Tree { root } = session.query(Query::GetTree) else {
            panic!("expected a tree");
        };
        assert_eq!(root.info.name, ROOT_NAME);
        assert_eq!(root.children.len(), 1);
        let g = &root.children[0];
        assert_eq!(g.info.kind, ItemKind::Group);
        assert_eq!(g.info.offset, Some(DVec2::new(10.0, 10.0)));
        assert_eq!(g.children[0].info.kind, ItemKind::Rect);
        assert_eq!(g.children[0].info.parent.as_deref(), Some("g"));
        assert!(g.children[0].info.mapped);
        assert_eq!(
            g.children[0].info.pixel_bounds,
            Bounds::from_edges(10.0, 10.0, 30.0, 30.0)
        );
    }

    #[test]
    fn test_duplicate_and_unknown_names_fail() {
        let mut session = session();
        session.execute(rect("a", Target::Root, 0.0, 0.0, 1.0, 1.0));

        let result = session.execute(rect("a", Target::Root, 0.0, 0.0, 1.0, 1.0));
        assert!(matches!(
            result,
            CommandResult::Error { ref message } if message.contains("already exists")
        ));

        let result = session.execute(Command::Show {
            target: Target::from("missing"),
        });
        assert!(matches!(
            result,
            CommandResult::Error { ref message } if message.contains("no item named")
        ));
    }

    #[test]
    fn test_raise_reports_only_moved_items() {
        let mut session = session();
        session.execute(rect("a", Target::Root, 0.0, 0.0, 10.0, 10.0));
        session.execute(rect("b", Target::Root, 0.0, 0.0, 10.0, 10.0));
        session.execute(Command::RunIdle);
        assert_eq!(item_at(&session, 5.0, 5.0).as_deref(), Some("b"));

        let result = session.execute(Command::Raise {
            target: Target::from("a"),
            positions: 1,
        });
        assert_eq!(result, CommandResult::modified(vec!["a".into()]));
        assert_eq!(item_at(&session, 5.0, 5.0).as_deref(), Some("a"));

        let result = session.execute(Command::RaiseToTop {
            target: Target::from("a"),
        });
        assert_eq!(result, CommandResult::modified(vec![]));
    }

    #[test]
    fn test_destroy_forgets_descendant_names() {
        let mut session = session();
        session.execute(group("g", DVec2::ZERO));
        session.execute(rect("a", Target::from("g"), 0.0, 0.0, 1.0, 1.0));
        session.execute(rect("b", Target::from("g"), 0.0, 0.0, 1.0, 1.0));

        let result = session.execute(Command::Destroy {
            target: Target::Items(vec!["g".into(), "a".into()]),
        });
        assert_eq!(
            result,
            CommandResult::deleted(vec!["a".into(), "b".into(), "g".into()])
        );
        assert_eq!(
            session.query(Query::GetItemCount),
            QueryResult::Count { count: 1 }
        );

        let result = session.execute(Command::Destroy { target: Target::Root });
        assert!(!result.is_success());
    }

    #[test]
    fn test_reparent_cycle_is_an_error() {
        let mut session = session();
        session.execute(group("outer", DVec2::ZERO));
        session.execute(Command::CreateGroup {
            name: "inner".into(),
            parent: Target::from("outer"),
            offset: DVec2::ZERO,
            consumes: vec![],
        });
        let result = session.execute(Command::Reparent {
            target: Target::from("outer"),
            group: Target::from("inner"),
        });
        assert!(!result.is_success());
    }

    #[test]
    fn test_pointer_input_logs_crossings_and_bubbles() {
        let mut session = session();
        session.execute(Command::CreateGroup {
            name: "g".into(),
            parent: Target::Root,
            offset: DVec2::ZERO,
            consumes: vec![EventKind::ButtonPress],
        });
        session.execute(rect("a", Target::from("g"), 0.0, 0.0, 10.0, 10.0));
        session.execute(Command::RunIdle);

        let result = session.execute(Command::Motion {
            x: 5.0,
            y: 5.0,
            time: 0,
        });
        assert_eq!(result, CommandResult::handled(false));

        let result = session.execute(Command::ButtonPress {
            x: 5.0,
            y: 5.0,
            button: 1,
            time: 0,
        });
        assert_eq!(result, CommandResult::handled(true));

        assert_eq!(
            events(&session),
            vec![
                ("a".to_string(), EventKind::Enter),
                ("g".to_string(), EventKind::Enter),
                ("root".to_string(), EventKind::Enter),
                ("a".to_string(), EventKind::Motion),
                ("g".to_string(), EventKind::Motion),
                ("root".to_string(), EventKind::Motion),
                ("a".to_string(), EventKind::ButtonPress),
                ("g".to_string(), EventKind::ButtonPress),
            ]
        );
    }

    #[test]
    fn test_grab_and_focus_targets() {
        let mut session = session();
        session.execute(rect("a", Target::Root, 0.0, 0.0, 10.0, 10.0));
        session.execute(Command::RunIdle);
        session.execute(Command::Motion {
            x: 5.0,
            y: 5.0,
            time: 0,
        });

        let result = session.execute(Command::Grab {
            target: Target::Current,
            events: vec![EventKind::Motion],
            cursor: Some("hand".into()),
            time: 0,
        });
        assert_eq!(result, CommandResult::modified(vec!["a".into()]));
        session.execute(Command::Focus {
            target: Target::from("a"),
        });

        assert_eq!(
            session.query(Query::GetPick),
            QueryResult::Pick {
                current: Some("a".into()),
                grabbed: Some("a".into()),
                focused: Some("a".into()),
            }
        );

        session.execute(Command::Ungrab {
            target: Target::Grabbed,
            time: 0,
        });
        let QueryResult::Host(host) = session.query(Query::GetHost) else {
            panic!("expected host info");
        };
        assert_eq!(host.pointer_grabs, 1);
        assert_eq!(host.pointer_ungrabs, 1);
        assert_eq!(host.focus_grabs, 1);
    }

    #[test]
    fn test_set_style_requires_a_rectangle() {
        let mut session = session();
        session.execute(group("g", DVec2::ZERO));
        session.execute(rect("a", Target::Root, 0.0, 0.0, 10.0, 10.0));

        let result = session.execute(Command::SetStyle {
            target: Target::from("a"),
            fill: Some(Rgba::new(255, 0, 0, 255)),
            outline: None,
            outline_width: None,
        });
        assert_eq!(result, CommandResult::modified(vec!["a".into()]));

        let result = session.execute(Command::SetStyle {
            target: Target::from("g"),
            fill: Some(Rgba::BLACK),
            outline: None,
            outline_width: None,
        });
        assert!(!result.is_success());
    }

    #[test]
    fn test_draw_records_frame_and_clears_damage() {
        let mut session = session();
        session.execute(rect("a", Target::Root, 10.0, 10.0, 10.0, 10.0));
        session.execute(Command::RunIdle);
        let QueryResult::Damage { rects } = session.query(Query::GetDamage) else {
            panic!("expected damage");
        };
        assert!(!rects.is_empty());

        session.execute(Command::Draw { clip: None });
        let QueryResult::Frame { ops } = session.query(Query::GetFrame) else {
            panic!("expected a frame");
        };
        assert!(matches!(ops[0], DrawOp::Background { .. }));
        assert!(ops.contains(&DrawOp::Fill {
            rect: PixelRect::new(10, 10, 21, 21),
            color: Rgba::BLACK,
        }));
        assert_eq!(
            session.query(Query::GetDamage),
            QueryResult::Damage { rects: vec![] }
        );
    }

    #[test]
    fn test_children_of_query_target() {
        let mut session = session();
        session.execute(group("g", DVec2::ZERO));
        session.execute(rect("a", Target::from("g"), 0.0, 0.0, 1.0, 1.0));
        session.execute(rect("b", Target::from("g"), 0.0, 0.0, 1.0, 1.0));

        let result = session.execute(Command::Hide {
            target: Target::Query(ItemQuery::ChildrenOf(Box::new(Target::from("g")))),
        });
        assert_eq!(result, CommandResult::modified(vec!["a".into(), "b".into()]));

        let QueryResult::Items { items } = session.query(Query::GetItems {
            target: Target::Query(ItemQuery::ParentOf(Box::new(Target::Items(vec![
                "a".into(),
                "b".into(),
            ])))),
        }) else {
            panic!("expected items");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "g");
    }

    #[test]
    fn test_invalid_zoom_is_reported() {
        let mut session = session();
        let result = session.execute(Command::SetPixelsPerUnit {
            pixels_per_unit: 0.0,
        });
        assert!(!result.is_success());
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let mut session = session();
        let result = session.execute(Command::Batch {
            commands: vec![
                rect("a", Target::Root, 0.0, 0.0, 1.0, 1.0),
                rect("a", Target::Root, 0.0, 0.0, 1.0, 1.0),
                rect("b", Target::Root, 0.0, 0.0, 1.0, 1.0),
            ],
        });
        assert!(!result.is_success());
        assert_eq!(
            session.query(Query::GetItemCount),
            QueryResult::Count { count: 2 }
        );
    }
}
