use tracing::error;
use tracing::info;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;

use super::blob_text;
use super::describe;
use crate::error::RendererError;
use crate::error::Result;
use crate::pipeline::ConstantBufferBinding;
use crate::pipeline::RootSignatureVersion;
use crate::pipeline::ShaderStage;

/// Asks the device for root signature 1.1 support.
pub fn highest_root_signature_version(device: &ID3D12Device) -> RootSignatureVersion {
    let mut feature_data = D3D12_FEATURE_DATA_ROOT_SIGNATURE {
        HighestVersion: D3D_ROOT_SIGNATURE_VERSION_1_1,
    };
    let supported = unsafe {
        device.CheckFeatureSupport(
            D3D12_FEATURE_ROOT_SIGNATURE,
            &mut feature_data as *mut _ as *mut _,
            std::mem::size_of::<D3D12_FEATURE_DATA_ROOT_SIGNATURE>() as u32,
        )
    };
    let highest = match supported {
        Ok(()) if feature_data.HighestVersion == D3D_ROOT_SIGNATURE_VERSION_1_1 => {
            Some(RootSignatureVersion::V1_1)
        }
        Ok(()) => Some(RootSignatureVersion::V1_0),
        Err(_) => None,
    };
    let version = RootSignatureVersion::negotiate(highest);
    info!("Using root signature version {version:?}");
    version
}

fn visibility(stage: ShaderStage) -> D3D12_SHADER_VISIBILITY {
    match stage {
        ShaderStage::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
        ShaderStage::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

/// One descriptor table holding a single constant buffer view.
pub fn create_root_signature(
    device: &ID3D12Device,
    version: RootSignatureVersion,
    binding: &ConstantBufferBinding,
) -> Result<ID3D12RootSignature> {
    debug_assert_eq!(binding.root_parameter, 0, "the table is the only root parameter");

    let flags = D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_HULL_SHADER_ROOT_ACCESS
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_DOMAIN_SHADER_ROOT_ACCESS
        | D3D12_ROOT_SIGNATURE_FLAG_DENY_GEOMETRY_SHADER_ROOT_ACCESS;

    let range_1_1 = D3D12_DESCRIPTOR_RANGE1 {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        NumDescriptors: 1,
        BaseShaderRegister: binding.shader_register,
        RegisterSpace: 0,
        Flags: D3D12_DESCRIPTOR_RANGE_FLAG_DATA_STATIC,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    };
    let parameter_1_1 = D3D12_ROOT_PARAMETER1 {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER1_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE1 {
                NumDescriptorRanges: 1,
                pDescriptorRanges: &range_1_1,
            },
        },
        ShaderVisibility: visibility(binding.visibility),
    };

    let range_1_0 = D3D12_DESCRIPTOR_RANGE {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        NumDescriptors: 1,
        BaseShaderRegister: binding.shader_register,
        RegisterSpace: 0,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    };
    let parameter_1_0 = D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                NumDescriptorRanges: 1,
                pDescriptorRanges: &range_1_0,
            },
        },
        ShaderVisibility: visibility(binding.visibility),
    };

    let desc = match version {
        RootSignatureVersion::V1_1 => D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
            Version: D3D_ROOT_SIGNATURE_VERSION_1_1,
            Anonymous: D3D12_VERSIONED_ROOT_SIGNATURE_DESC_0 {
                Desc_1_1: D3D12_ROOT_SIGNATURE_DESC1 {
                    NumParameters: 1,
                    pParameters: &parameter_1_1,
                    NumStaticSamplers: 0,
                    pStaticSamplers: std::ptr::null(),
                    Flags: flags,
                },
            },
        },
        RootSignatureVersion::V1_0 => D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
            Version: D3D_ROOT_SIGNATURE_VERSION_1_0,
            Anonymous: D3D12_VERSIONED_ROOT_SIGNATURE_DESC_0 {
                Desc_1_0: D3D12_ROOT_SIGNATURE_DESC {
                    NumParameters: 1,
                    pParameters: &parameter_1_0,
                    NumStaticSamplers: 0,
                    pStaticSamplers: std::ptr::null(),
                    Flags: flags,
                },
            },
        },
    };

    let mut signature_blob = None;
    let mut error_blob = None;
    let serialized = unsafe {
        D3D12SerializeVersionedRootSignature(&desc, &mut signature_blob, Some(&mut error_blob))
    };

    if let Err(e) = serialized {
        let message = match error_blob {
            Some(blob) => blob_text(&blob),
            None => describe(e),
        };
        error!("Root signature serialization error: {message}");
        return Err(RendererError::RootSignature(message).into());
    }
    let signature_blob = signature_blob
        .ok_or_else(|| RendererError::RootSignature("serializer produced no blob".into()))?;

    let signature_data: &[u8] = unsafe {
        std::slice::from_raw_parts(
            signature_blob.GetBufferPointer() as *const u8,
            signature_blob.GetBufferSize(),
        )
    };

    unsafe { device.CreateRootSignature(0, signature_data) }
        .map_err(|e| RendererError::RootSignature(describe(e)).into())
}
