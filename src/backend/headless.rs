//! Display-less backends
//!
//! [`HeadlessWindows`] keeps its windows and event queue in memory. Events
//! are queued through a [`HeadlessHandle`] and delivered on the next poll,
//! exactly like a platform queue would deliver them. [`RecordingGraphics`]
//! accepts every graphics call and appends it to a shared [`GraphicsLog`].
//!
//! Both sides hand out cloneable handles so a test (or a scripted driver) can
//! keep observing the backend after it has been moved into an engine.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Mat4;
use log::{debug, trace};

use super::{
    BackendError, DrawCall, Filter, GraphicsBackend, Index, MeshHandle, NativeWindow,
    ShaderHandle, TextureHandle, TextureInfo, Vertex, WindowBackend, WindowDescriptor,
};
use crate::event::{Event, RawEvent, WindowMoveEvent, WindowResizeEvent};
use crate::identity::Identity;

#[derive(Debug)]
struct WindowRecord {
    entity: Identity,
    title: String,
    size: (u32, u32),
    position: (i32, i32),
    closed: bool,
    alive: bool,
    presents: u64,
}

#[derive(Debug)]
enum Queued {
    Window(Identity, Event),
    Raw(RawEvent),
}

#[derive(Debug, Default)]
struct WindowState {
    initialized: bool,
    terminated: bool,
    init_failure: Option<String>,
    windows: HashMap<Identity, WindowRecord>,
    created: usize,
    queue: VecDeque<Queued>,
    polls: u64,
}

/// In-memory window backend.
#[derive(Default)]
pub struct HeadlessWindows {
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessWindows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl WindowBackend for HeadlessWindows {
    fn initialize(&mut self) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = state.init_failure.clone() {
            return Err(BackendError::Initialization(reason));
        }
        state.initialized = true;
        state.terminated = false;
        debug!("Headless window backend initialized");
        Ok(())
    }

    fn terminate(&mut self) {
        let mut state = self.state.borrow_mut();
        state.initialized = false;
        state.terminated = true;
        state.queue.clear();
        debug!("Headless window backend terminated");
    }

    fn create_window(
        &mut self,
        descriptor: &WindowDescriptor,
        window: Identity,
        entity: Identity,
    ) -> Result<Box<dyn NativeWindow>, BackendError> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(BackendError::WindowCreation {
                title: descriptor.title.clone(),
                reason: BackendError::NotInitialized.to_string(),
            });
        }
        state.windows.insert(
            window,
            WindowRecord {
                entity,
                title: descriptor.title.clone(),
                size: (descriptor.width, descriptor.height),
                position: (0, 0),
                closed: false,
                alive: true,
                presents: 0,
            },
        );
        state.created += 1;
        debug!(
            "Created headless window {:?} ({}x{}) for component {window}",
            descriptor.title, descriptor.width, descriptor.height
        );
        Ok(Box::new(HeadlessWindow {
            id: window,
            state: Rc::clone(&self.state),
        }))
    }

    fn poll_events(&mut self, sink: &mut dyn FnMut(RawEvent)) {
        self.state.borrow_mut().polls += 1;
        loop {
            // The borrow must end before the sink runs: handlers may query
            // windows, which reads the same state.
            let next = {
                let mut state = self.state.borrow_mut();
                match state.queue.pop_front() {
                    None => None,
                    Some(Queued::Raw(raw)) => Some(raw),
                    Some(Queued::Window(window, event)) => match state.windows.get_mut(&window) {
                        Some(record) if record.alive => {
                            apply_to_record(record, &event);
                            Some(RawEvent {
                                event,
                                window,
                                entity: record.entity,
                            })
                        }
                        _ => {
                            trace!("Dropping event for unknown or destroyed window {window}");
                            continue;
                        }
                    },
                }
            };
            match next {
                Some(raw) => sink(raw),
                None => break,
            }
        }
    }
}

fn apply_to_record(record: &mut WindowRecord, event: &Event) {
    if let Some(WindowResizeEvent { width, height }) = event.get::<WindowResizeEvent>() {
        record.size = (*width, *height);
    }
    if let Some(WindowMoveEvent { x, y }) = event.get::<WindowMoveEvent>() {
        record.position = (*x, *y);
    }
}

struct HeadlessWindow {
    id: Identity,
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessWindow {
    fn read<T>(&self, f: impl FnOnce(&WindowRecord) -> T) -> Option<T> {
        self.state.borrow().windows.get(&self.id).map(f)
    }
}

impl NativeWindow for HeadlessWindow {
    fn title(&self) -> String {
        self.read(|r| r.title.clone()).unwrap_or_default()
    }

    fn size(&self) -> (u32, u32) {
        self.read(|r| r.size).unwrap_or((0, 0))
    }

    fn position(&self) -> (i32, i32) {
        self.read(|r| r.position).unwrap_or((0, 0))
    }

    fn closed(&self) -> bool {
        self.read(|r| r.closed).unwrap_or(true)
    }

    fn present(&mut self) {
        if let Some(record) = self.state.borrow_mut().windows.get_mut(&self.id) {
            record.presents += 1;
        }
    }
}

impl Drop for HeadlessWindow {
    fn drop(&mut self) {
        if let Some(record) = self.state.borrow_mut().windows.get_mut(&self.id) {
            record.alive = false;
            record.closed = true;
        }
    }
}

/// Scripting and inspection handle for [`HeadlessWindows`].
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessHandle {
    /// Makes the next `initialize` call fail with `reason`.
    pub fn fail_initialization(&self, reason: impl Into<String>) {
        self.state.borrow_mut().init_failure = Some(reason.into());
    }

    /// Queues an event for delivery on the next poll, as if window `window`
    /// had reported it.
    pub fn push_event(&self, window: Identity, event: impl Into<Event>) {
        self.state
            .borrow_mut()
            .queue
            .push_back(Queued::Window(window, event.into()));
    }

    /// Queues a fully tagged event without checking that its window exists.
    pub fn push_raw(&self, raw: RawEvent) {
        self.state.borrow_mut().queue.push_back(Queued::Raw(raw));
    }

    /// Marks a window as closed by the user.
    pub fn close(&self, window: Identity) {
        if let Some(record) = self.state.borrow_mut().windows.get_mut(&window) {
            record.closed = true;
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    pub fn is_terminated(&self) -> bool {
        self.state.borrow().terminated
    }

    pub fn polls(&self) -> u64 {
        self.state.borrow().polls
    }

    pub fn windows_created(&self) -> usize {
        self.state.borrow().created
    }

    pub fn live_windows(&self) -> usize {
        self.state
            .borrow()
            .windows
            .values()
            .filter(|r| r.alive)
            .count()
    }

    pub fn is_alive(&self, window: Identity) -> bool {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map_or(false, |r| r.alive)
    }

    pub fn presents(&self, window: Identity) -> u64 {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map_or(0, |r| r.presents)
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().queue.len()
    }
}

/// A graphics call observed by [`RecordingGraphics`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    Initialize,
    CompileShader(ShaderHandle),
    LoadTexture(TextureHandle),
    CreateMesh {
        mesh: MeshHandle,
        vertices: usize,
        indices: usize,
    },
    UpdateMesh {
        mesh: MeshHandle,
        vertices: usize,
        indices: usize,
    },
    Viewport {
        window: Identity,
        width: u32,
        height: u32,
    },
    ViewProjection {
        window: Identity,
        matrix: Mat4,
    },
    Draw(DrawCall),
    ReleaseMesh(MeshHandle),
    ReleaseShader(ShaderHandle),
    ReleaseTexture(TextureHandle),
}

#[derive(Debug, Default)]
struct GraphicsState {
    initialized: bool,
    shader_failure: Option<String>,
    textures: HashMap<PathBuf, (u32, u32, u8)>,
    next_handle: u32,
    commands: Vec<GraphicsCommand>,
    meshes: HashMap<MeshHandle, (Vec<Vertex>, Vec<Index>)>,
}

impl GraphicsState {
    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Graphics backend that records instead of rendering.
#[derive(Default)]
pub struct RecordingGraphics {
    state: Rc<RefCell<GraphicsState>>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> GraphicsLog {
        GraphicsLog {
            state: Rc::clone(&self.state),
        }
    }

    fn record(&self, command: GraphicsCommand) {
        trace!("graphics: {command:?}");
        self.state.borrow_mut().commands.push(command);
    }

    fn require_context(&self) -> Result<(), BackendError> {
        if self.state.borrow().initialized {
            Ok(())
        } else {
            Err(BackendError::NoContext)
        }
    }
}

impl GraphicsBackend for RecordingGraphics {
    fn initialize(&mut self) -> Result<(), BackendError> {
        self.state.borrow_mut().initialized = true;
        self.record(GraphicsCommand::Initialize);
        Ok(())
    }

    fn compile_shader(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, BackendError> {
        self.require_context()?;
        if let Some(reason) = self.state.borrow().shader_failure.clone() {
            return Err(BackendError::ShaderCompilation(reason));
        }
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(BackendError::ShaderCompilation(
                "empty shader source".to_string(),
            ));
        }
        let handle = ShaderHandle(self.state.borrow_mut().next_handle());
        self.record(GraphicsCommand::CompileShader(handle));
        Ok(handle)
    }

    fn load_texture(&mut self, path: &Path, _filter: Filter) -> Result<TextureInfo, BackendError> {
        self.require_context()?;
        let registered = self.state.borrow().textures.get(path).copied();
        let (width, height, channels) = registered.ok_or_else(|| BackendError::TextureLoad {
            path: path.to_path_buf(),
            reason: "no such texture".to_string(),
        })?;
        let handle = TextureHandle(self.state.borrow_mut().next_handle());
        self.record(GraphicsCommand::LoadTexture(handle));
        Ok(TextureInfo {
            handle,
            width,
            height,
            channels,
        })
    }

    fn create_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[Index],
    ) -> Result<MeshHandle, BackendError> {
        self.require_context()?;
        let mesh = {
            let mut state = self.state.borrow_mut();
            let mesh = MeshHandle(state.next_handle());
            state
                .meshes
                .insert(mesh, (vertices.to_vec(), indices.to_vec()));
            mesh
        };
        self.record(GraphicsCommand::CreateMesh {
            mesh,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(mesh)
    }

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[Vertex], indices: &[Index]) {
        if let Some(data) = self.state.borrow_mut().meshes.get_mut(&mesh) {
            *data = (vertices.to_vec(), indices.to_vec());
        }
        self.record(GraphicsCommand::UpdateMesh {
            mesh,
            vertices: vertices.len(),
            indices: indices.len(),
        });
    }

    fn set_viewport(&mut self, window: Identity, width: u32, height: u32) {
        self.record(GraphicsCommand::Viewport {
            window,
            width,
            height,
        });
    }

    fn set_view_projection(&mut self, window: Identity, view_projection: Mat4) {
        self.record(GraphicsCommand::ViewProjection {
            window,
            matrix: view_projection,
        });
    }

    fn draw(&mut self, call: &DrawCall) {
        self.record(GraphicsCommand::Draw(*call));
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        self.state.borrow_mut().meshes.remove(&mesh);
        self.record(GraphicsCommand::ReleaseMesh(mesh));
    }

    fn release_shader(&mut self, shader: ShaderHandle) {
        self.record(GraphicsCommand::ReleaseShader(shader));
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.record(GraphicsCommand::ReleaseTexture(texture));
    }
}

/// Shared view of everything a [`RecordingGraphics`] has seen.
#[derive(Clone)]
pub struct GraphicsLog {
    state: Rc<RefCell<GraphicsState>>,
}

impl GraphicsLog {
    /// Makes every following shader compilation fail.
    pub fn fail_shader_compilation(&self, reason: impl Into<String>) {
        self.state.borrow_mut().shader_failure = Some(reason.into());
    }

    /// Makes `path` loadable as a texture of the given dimensions.
    pub fn register_texture(&self, path: impl Into<PathBuf>, width: u32, height: u32, channels: u8) {
        self.state
            .borrow_mut()
            .textures
            .insert(path.into(), (width, height, channels));
    }

    pub fn commands(&self) -> Vec<GraphicsCommand> {
        self.state.borrow().commands.clone()
    }

    pub fn count(&self, predicate: impl Fn(&GraphicsCommand) -> bool) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|&c| predicate(c))
            .count()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                GraphicsCommand::Draw(call) => Some(*call),
                _ => None,
            })
            .collect()
    }

    pub fn live_meshes(&self) -> usize {
        self.state.borrow().meshes.len()
    }

    /// Vertex data currently uploaded for `mesh`.
    pub fn mesh_vertices(&self, mesh: MeshHandle) -> Option<Vec<Vertex>> {
        self.state
            .borrow()
            .meshes
            .get(&mesh)
            .map(|(vertices, _)| vertices.clone())
    }

    pub fn clear(&self) {
        self.state.borrow_mut().commands.clear();
    }
}
