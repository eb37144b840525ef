use eyre::eyre;
use eyre::WrapErr;
use tracing::debug;
use tracing::error;
use tracing::info;
use windows::core::Interface;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

use super::create_device::create_device;
use super::create_device::CreatedDevice;
use super::create_pipeline_state::create_pipeline_state;
use super::create_root_signature::create_root_signature;
use super::create_root_signature::highest_root_signature_version;
use super::debug_messages::log_dxgi_debug_messages;
use super::describe;
use super::fence::D3d12Fence;
use super::transition_barrier::transition_barrier;
use super::upload_buffer::create_upload_buffer;
use super::upload_buffer::map_for_write;
use super::upload_buffer::upload_bytes;
use crate::config::RendererConfig;
use crate::error::RendererError;
use crate::error::Result;
use crate::error::WindowsResultExt;
use crate::gpu::Command;
use crate::gpu::CommandList;
use crate::gpu::ConstantBufferId;
use crate::gpu::CpuDescriptor;
use crate::gpu::DescriptorHeapLayout;
use crate::gpu::GpuDevice;
use crate::gpu::PipelineId;
use crate::gpu::VertexBufferView;
use crate::gpu::FRAME_COUNT;
use crate::pipeline::PipelineDesc;
use crate::pipeline::RootSignatureVersion;

/// Shader-visible CBV slots; the renderer only needs the transform.
const CBV_HEAP_CAPACITY: u32 = 1;

struct Pipeline {
    root_signature: ID3D12RootSignature,
    state: ID3D12PipelineState,
}

/// Stays mapped until dropped.
struct MappedConstantBuffer {
    resource: ID3D12Resource,
    data: *mut u8,
    size: u64,
}

impl Drop for MappedConstantBuffer {
    fn drop(&mut self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}

pub struct D3d12Device {
    // Field order is drop order: GPU objects go before the device and factory.
    constant_buffers: Vec<MappedConstantBuffer>,
    vertex_buffers: Vec<ID3D12Resource>,
    pipelines: Vec<Pipeline>,
    command_list: ID3D12GraphicsCommandList,
    command_allocators: [ID3D12CommandAllocator; FRAME_COUNT],
    fence: D3d12Fence,
    cbv_heap: ID3D12DescriptorHeap,
    cbv_descriptor_size: u32,
    rtv_heap: ID3D12DescriptorHeap,
    rtv_descriptor_size: u32,
    render_targets: [ID3D12Resource; FRAME_COUNT],
    swap_chain: IDXGISwapChain3,
    command_queue: ID3D12CommandQueue,
    root_signature_version: RootSignatureVersion,
    info_queue: Option<IDXGIInfoQueue>,
    device: ID3D12Device,
    _dxgi_factory: IDXGIFactory4,
}

impl D3d12Device {
    /// Creates the device, a direct queue and a flip-discard swap chain of
    /// `FRAME_COUNT` buffers for `hwnd`. No depth buffer.
    pub fn create(hwnd: HWND, config: &RendererConfig) -> Result<Self> {
        let CreatedDevice {
            dxgi_factory,
            device,
            info_queue,
        } = create_device(config.use_warp_device)?;

        let result = Self::create_with(dxgi_factory, device, info_queue.clone(), hwnd, config);
        if result.is_err() {
            log_dxgi_debug_messages(info_queue.as_ref());
        }
        result
    }

    fn create_with(
        dxgi_factory: IDXGIFactory4,
        device: ID3D12Device,
        info_queue: Option<IDXGIInfoQueue>,
        hwnd: HWND,
        config: &RendererConfig,
    ) -> Result<Self> {
        let command_queue: ID3D12CommandQueue = unsafe {
            device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                ..Default::default()
            })
        }
        .map_err(|e| RendererError::DeviceCreation(describe(e)))?;

        let surface_error = |e| RendererError::SurfaceCreation(describe(e));

        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
            BufferCount: FRAME_COUNT as u32,
            Width: config.width,
            Height: config.height,
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let swap_chain: IDXGISwapChain3 = unsafe {
            dxgi_factory.CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
        }
        .and_then(|swap_chain| swap_chain.cast())
        .map_err(surface_error)?;
        unsafe { dxgi_factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }
            .map_err(surface_error)?;
        info!(
            "Swap chain created: {} buffers of {}x{}",
            FRAME_COUNT, config.width, config.height
        );

        let render_targets: [ID3D12Resource; FRAME_COUNT] =
            array_init::try_array_init(|i| unsafe { swap_chain.GetBuffer(i as u32) })
                .map_err(surface_error)?;

        let heap_error = |e| RendererError::ResourceAllocation {
            what: "descriptor heap",
            message: describe(e),
        };
        let rtv_heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: FRAME_COUNT as u32,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                ..Default::default()
            })
        }
        .map_err(heap_error)?;
        let rtv_descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) };

        let cbv_heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: CBV_HEAP_CAPACITY,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
                Flags: D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE,
                ..Default::default()
            })
        }
        .map_err(heap_error)?;
        let cbv_descriptor_size = unsafe {
            device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
        };

        let command_allocators: [ID3D12CommandAllocator; FRAME_COUNT] =
            array_init::try_array_init(|_| unsafe {
                device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
            })
            .map_err(|e| RendererError::ResourceAllocation {
                what: "command allocator",
                message: describe(e),
            })?;

        let command_list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &command_allocators[0],
                None,
            )
        }
        .map_err(|e| RendererError::ResourceAllocation {
            what: "command list",
            message: describe(e),
        })?;
        // Lists start out recording; every frame expects a closed one to reset.
        unsafe { command_list.Close() }
            .into_report()
            .wrap_err("Failed to close the new command list")?;

        let fence = D3d12Fence::create(&device)?;
        let root_signature_version = highest_root_signature_version(&device);

        Ok(Self {
            constant_buffers: Vec::new(),
            vertex_buffers: Vec::new(),
            pipelines: Vec::new(),
            command_list,
            command_allocators,
            fence,
            cbv_heap,
            cbv_descriptor_size,
            rtv_heap,
            rtv_descriptor_size,
            render_targets,
            swap_chain,
            command_queue,
            root_signature_version,
            info_queue,
            device,
            _dxgi_factory: dxgi_factory,
        })
    }

    pub fn info_queue(&self) -> Option<&IDXGIInfoQueue> {
        self.info_queue.as_ref()
    }

    pub fn log_debug_messages(&self) {
        log_dxgi_debug_messages(self.info_queue());
    }

    fn encode(&self, pipeline: &Pipeline, command: &Command) {
        let list = &self.command_list;
        unsafe {
            match *command {
                Command::SetRootSignature => {
                    list.SetGraphicsRootSignature(&pipeline.root_signature);
                }
                Command::SetViewport(viewport) => list.RSSetViewports(&[D3D12_VIEWPORT {
                    TopLeftX: viewport.top_left_x,
                    TopLeftY: viewport.top_left_y,
                    Width: viewport.width,
                    Height: viewport.height,
                    MinDepth: viewport.min_depth,
                    MaxDepth: viewport.max_depth,
                }]),
                Command::SetScissorRect(rect) => list.RSSetScissorRects(&[RECT {
                    left: rect.left,
                    top: rect.top,
                    right: rect.right,
                    bottom: rect.bottom,
                }]),
                Command::SetDescriptorTable { root_parameter } => {
                    list.SetDescriptorHeaps(&[Some(self.cbv_heap.clone())]);
                    list.SetGraphicsRootDescriptorTable(
                        root_parameter,
                        self.cbv_heap.GetGPUDescriptorHandleForHeapStart(),
                    );
                }
                Command::Barrier {
                    buffer_index,
                    before,
                    after,
                } => list.ResourceBarrier(&[transition_barrier(
                    &self.render_targets[buffer_index],
                    before,
                    after,
                )]),
                Command::SetRenderTarget(target) => {
                    let handle = D3D12_CPU_DESCRIPTOR_HANDLE { ptr: target.0 };
                    list.OMSetRenderTargets(1, Some(&handle), false, None);
                }
                Command::ClearRenderTarget { target, color } => list.ClearRenderTargetView(
                    D3D12_CPU_DESCRIPTOR_HANDLE { ptr: target.0 },
                    &color,
                    None,
                ),
                Command::SetTriangleList => {
                    list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST)
                }
                Command::SetVertexBuffer(view) => list.IASetVertexBuffers(
                    0,
                    Some(&[D3D12_VERTEX_BUFFER_VIEW {
                        BufferLocation: view.location,
                        SizeInBytes: view.size_in_bytes,
                        StrideInBytes: view.stride,
                    }]),
                ),
                Command::Draw {
                    vertex_count,
                    instance_count,
                } => list.DrawInstanced(vertex_count, instance_count, 0, 0),
            }
        }
    }
}

impl GpuDevice for D3d12Device {
    type Fence = D3d12Fence;

    fn buffer_count(&self) -> usize {
        self.render_targets.len()
    }

    fn current_buffer_index(&self) -> usize {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() as usize }
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        let hr = unsafe { self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) };
        if hr == DXGI_ERROR_DEVICE_REMOVED || hr == DXGI_ERROR_DEVICE_RESET {
            let reason = match unsafe { self.device.GetDeviceRemovedReason() } {
                Ok(()) => format!("{hr:?}"),
                Err(e) => describe(e),
            };
            error!("Device removed during present: {reason}");
            self.log_debug_messages();
            return Err(RendererError::DeviceRemoved { reason }.into());
        }
        hr.ok().into_report().wrap_err("Present failed")
    }

    fn rtv_heap(&self) -> DescriptorHeapLayout {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        DescriptorHeapLayout {
            start: CpuDescriptor(start.ptr),
            increment: self.rtv_descriptor_size,
            capacity: FRAME_COUNT as u32,
        }
    }

    fn create_render_target_view(
        &mut self,
        buffer_index: usize,
        descriptor: CpuDescriptor,
    ) -> Result<()> {
        let resource = self
            .render_targets
            .get(buffer_index)
            .ok_or_else(|| eyre!("no swap chain buffer {buffer_index}"))?;
        unsafe {
            self.device.CreateRenderTargetView(
                resource,
                None,
                D3D12_CPU_DESCRIPTOR_HANDLE { ptr: descriptor.0 },
            )
        };
        Ok(())
    }

    fn create_vertex_buffer(&mut self, bytes: &[u8], stride: u32) -> Result<VertexBufferView> {
        let size_in_bytes =
            u32::try_from(bytes.len()).map_err(|_| RendererError::ResourceAllocation {
                what: "vertex buffer",
                message: format!("{} bytes do not fit a vertex buffer view", bytes.len()),
            })?;
        let buffer = upload_bytes(&self.device, bytes, "Vertex buffer")?;
        let view = VertexBufferView {
            location: unsafe { buffer.GetGPUVirtualAddress() },
            size_in_bytes,
            stride,
        };
        self.vertex_buffers.push(buffer);
        Ok(view)
    }

    fn create_constant_buffer(&mut self, size: u64) -> Result<ConstantBufferId> {
        let index = self.constant_buffers.len() as u32;
        if index >= CBV_HEAP_CAPACITY {
            return Err(RendererError::ResourceAllocation {
                what: "constant buffer view",
                message: format!("the CBV heap holds only {CBV_HEAP_CAPACITY} views"),
            }
            .into());
        }

        let resource = create_upload_buffer(&self.device, size, "Transform constant buffer")?;
        let mut handle = unsafe { self.cbv_heap.GetCPUDescriptorHandleForHeapStart() };
        handle.ptr += (index * self.cbv_descriptor_size) as usize;
        unsafe {
            self.device.CreateConstantBufferView(
                Some(&D3D12_CONSTANT_BUFFER_VIEW_DESC {
                    BufferLocation: resource.GetGPUVirtualAddress(),
                    SizeInBytes: size as u32,
                }),
                handle,
            )
        };

        let data = map_for_write(&resource)?;
        self.constant_buffers.push(MappedConstantBuffer {
            resource,
            data,
            size,
        });
        debug!("Constant buffer {index} ({size} bytes) mapped");
        Ok(ConstantBufferId(index))
    }

    fn write_constant_buffer(&mut self, buffer: ConstantBufferId, bytes: &[u8]) -> Result<()> {
        let target = self
            .constant_buffers
            .get(buffer.0 as usize)
            .ok_or_else(|| eyre!("unknown constant buffer {buffer:?}"))?;
        if bytes.len() as u64 > target.size {
            return Err(eyre!(
                "{} bytes do not fit constant buffer {buffer:?} of {} bytes",
                bytes.len(),
                target.size
            ));
        }
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), target.data, bytes.len()) };
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId> {
        let root_signature =
            create_root_signature(&self.device, self.root_signature_version, &desc.binding)?;
        let state = create_pipeline_state(&self.device, &root_signature, desc)?;
        self.pipelines.push(Pipeline {
            root_signature,
            state,
        });
        Ok(PipelineId(self.pipelines.len() as u32 - 1))
    }

    fn record(&mut self, frame_index: usize, commands: &CommandList) -> Result<()> {
        let pipeline = self
            .pipelines
            .get(commands.pipeline().0 as usize)
            .ok_or_else(|| eyre!("unknown pipeline {:?}", commands.pipeline()))?;
        let allocator = &self.command_allocators[frame_index];

        unsafe { allocator.Reset() }
            .into_report()
            .wrap_err_with(|| format!("Failed to reset command allocator {frame_index}"))?;
        unsafe { self.command_list.Reset(allocator, &pipeline.state) }
            .into_report()
            .wrap_err("Failed to reset the command list")?;

        for command in commands.commands() {
            self.encode(pipeline, command);
        }

        unsafe { self.command_list.Close() }
            .into_report()
            .wrap_err("Failed to close the command list")
    }

    fn execute(&mut self) -> Result<()> {
        let command_list = self
            .command_list
            .cast::<ID3D12CommandList>()
            .map_err(|e| RendererError::CommandSubmission(describe(e)))?;
        unsafe { self.command_queue.ExecuteCommandLists(&[Some(command_list)]) };
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        unsafe { self.command_queue.Signal(self.fence.raw(), value) }.map_err(|e| {
            RendererError::FenceSignal {
                value,
                message: describe(e),
            }
            .into()
        })
    }

    fn fence(&self) -> &D3d12Fence {
        &self.fence
    }
}
