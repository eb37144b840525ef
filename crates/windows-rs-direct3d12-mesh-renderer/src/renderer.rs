use eyre::bail;
use eyre::WrapErr;
use tracing::debug;
use tracing::info;

use crate::assets::asset_path;
use crate::camera::CameraController;
use crate::camera::CameraKey;
use crate::camera::CameraSettings;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::frame_resources::FrameResourceSet;
use crate::frame_sequencer::FrameSequencer;
use crate::geometry::GeometryResources;
use crate::gpu::GpuDevice;
use crate::gpu::PipelineId;
use crate::pipeline::PipelineDesc;
use crate::pipeline::SHADER_FILE;
use crate::transforms::ProjectionSettings;
use crate::transforms::TransformState;
use crate::vertex::Vertex;

/// What the window shell drives once a renderer exists.
pub trait RendererHooks {
    /// Advances the simulation by one step.
    fn tick(&mut self) -> Result<()>;

    fn render(&mut self) -> Result<()>;

    fn on_key_down(&mut self, key: u8);

    fn on_key_up(&mut self, key: u8);

    /// Waits for the GPU to go idle. Safe to call more than once.
    fn shutdown(&mut self) -> Result<()>;

    fn title(&self) -> String;
}

pub struct Renderer<D: GpuDevice> {
    device: D,
    frames: FrameResourceSet,
    geometry: GeometryResources,
    pipeline: PipelineId,
    sequencer: FrameSequencer,
    camera: CameraController,
    transforms: TransformState,
    title: String,
    shut_down: bool,
}

impl<D: GpuDevice> Renderer<D> {
    /// Builds every GPU resource on top of `device` and waits for the GPU
    /// once before returning. The mesh is checked before any shader work, so
    /// an empty scene never reaches pipeline creation.
    pub fn initialize(mut device: D, config: &RendererConfig, vertices: &[Vertex]) -> Result<Self> {
        let frames = FrameResourceSet::acquire_render_targets(&mut device)
            .wrap_err("Failed to create render target views")?;
        let geometry = GeometryResources::create(&mut device, vertices)?;

        let camera = CameraController::new(CameraSettings::default());
        let mut transforms =
            TransformState::new(config.aspect_ratio(), ProjectionSettings::default());
        transforms.set_view(camera.view());
        geometry.write_transform(&mut device, &transforms.mwp())?;

        let desc = PipelineDesc::new(asset_path(SHADER_FILE)?, config.fill_mode);
        let pipeline = device.create_pipeline(&desc)?;
        debug!("Pipeline ready ({:?} fill)", config.fill_mode);

        let mut sequencer =
            FrameSequencer::new(&device, config.width, config.height, config.vsync_interval);
        sequencer.wait_for_previous_frame(&mut device)?;

        info!(
            "Renderer initialized: {}x{}, {} vertices",
            config.width,
            config.height,
            geometry.mesh.vertex_count()
        );
        Ok(Self {
            device,
            frames,
            geometry,
            pipeline,
            sequencer,
            camera,
            transforms,
            title: config.title(),
            shut_down: false,
        })
    }
}

impl<D: GpuDevice> RendererHooks for Renderer<D> {
    fn tick(&mut self) -> Result<()> {
        let view = self.camera.update();
        self.transforms.set_view(view);
        self.geometry
            .write_transform(&mut self.device, &self.transforms.mwp())
    }

    fn render(&mut self) -> Result<()> {
        if self.shut_down {
            bail!("render called after shutdown");
        }
        self.sequencer.render_frame(
            &mut self.device,
            self.pipeline,
            &self.frames,
            &self.geometry.mesh,
        )
    }

    fn on_key_down(&mut self, key: u8) {
        if let Some(key) = CameraKey::from_virtual_key(key) {
            self.camera.key_down(key);
        }
    }

    fn on_key_up(&mut self, key: u8) {
        if let Some(key) = CameraKey::from_virtual_key(key) {
            self.camera.key_up(key);
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.sequencer
            .wait_for_previous_frame(&mut self.device)
            .wrap_err("Failed to drain the GPU before shutdown")?;
        self.shut_down = true;
        info!(
            "Renderer shut down after {} fence signals",
            self.sequencer.last_signaled()
        );
        Ok(())
    }

    fn title(&self) -> String {
        self.title.clone()
    }
}
