//! End-to-end workflows: allocate, copy, bind, launch, read back

use crate::prelude::*;
use std::sync::Once;

static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// The 2D fetch round-trip: a sequential array sampled back out through a
/// grid-launched copy kernel must equal its own copy-out.
#[test]
fn test_2d_fetch_through_copy_kernel() {
    init_logging();
    let width = 8usize;
    let height = 16usize;

    let device = Device::new(0).unwrap();
    let tex_data: Vec<f32> = (0..width * height).map(|i| i as f32).collect();
    let mut expected_output = vec![0.0f32; width * height];

    let desc = ChannelFormatDescriptor::new(32, 0, 0, 0, ChannelFormatKind::Float).unwrap();
    let array = DeviceArray::allocate(&device, desc, width, height, 0).unwrap();
    array.copy_from(&tex_data, None).unwrap();
    array.copy_to(&mut expected_output, None).unwrap();

    let resource = ResourceDescriptor::new(ResourceKind::Array, Some(&array)).unwrap();
    let tex_desc = TextureDescriptor::new(
        &[AddressMode::Clamp, AddressMode::Clamp],
        FilterMode::Point,
        ReadMode::ElementType,
    );
    let tex = TextureObject::create(&device, &resource, &tex_desc).unwrap();

    let real_output = DeviceMemory::<f32>::allocate(&device, width * height).unwrap();

    let (block_x, block_y) = (4u32, 4u32);
    let grid_x = (width as u32 + block_x - 1) / block_x;
    let grid_y = (height as u32 + block_y - 1) / block_y;
    let config = LaunchConfigBuilder::new()
        .grid_dim((grid_x, grid_y, 1))
        .block_dim((block_x, block_y, 1))
        .build();

    launch(&device, &config, |t| {
        let x = t.global_x() as usize;
        let y = t.global_y() as usize;
        if x < width && y < height {
            let texel = tex.tex2d(x as f32, y as f32);
            real_output.store(y * width + x, texel[0]);
        }
    })
    .unwrap();

    assert_eq!(real_output.copy_to_host().unwrap(), expected_output);
}

/// Same workflow with every transfer and the launch on one stream.
#[tokio::test]
async fn test_stream_ordered_fetch_workflow() {
    init_logging();
    let width = 8usize;
    let height = 16usize;

    let device = Device::new(0).unwrap();
    let stream = Stream::named(&device, "workflow", StreamFlags::default()).unwrap();

    let tex_data: Vec<f32> = (0..width * height).map(|i| (i as f32) * 0.5).collect();
    let array = DeviceArray::allocate(
        &device,
        ChannelFormatDescriptor::float1(),
        width,
        height,
        0,
    )
    .unwrap();
    array.copy_from(&tex_data, Some(&stream)).unwrap();

    let resource = ResourceDescriptor::from_array(&array);
    let tex_desc = TextureDescriptor::new(
        &[AddressMode::Clamp, AddressMode::Clamp],
        FilterMode::Point,
        ReadMode::ElementType,
    );
    let tex = TextureObject::create(&device, &resource, &tex_desc).unwrap();

    let output = DeviceMemory::<f32>::allocate(&device, width * height).unwrap();
    let config = LaunchConfigBuilder::new()
        .grid_dim((2, 4, 1))
        .block_dim((4, 4, 1))
        .stream(stream.clone())
        .build();

    launch(&device, &config, |t| {
        let x = t.global_x() as usize;
        let y = t.global_y() as usize;
        if x < width && y < height {
            output.store(y * width + x, tex.tex2d(x as f32, y as f32)[0]);
        }
    })
    .unwrap();

    device.synchronize().await.unwrap();
    assert_eq!(output.copy_to_host().unwrap(), tex_data);
    assert!(stream.is_complete());
}

#[test]
fn test_1d_fetch_through_copy_kernel() {
    init_logging();
    let width = 67usize;

    let device = Device::new(0).unwrap();
    let tex_data: Vec<f32> = (0..width).map(|i| (i as f32).cos()).collect();
    let array =
        DeviceArray::allocate(&device, ChannelFormatDescriptor::float1(), width, 0, 0).unwrap();
    array.copy_from(&tex_data, None).unwrap();

    let resource = ResourceDescriptor::from_array(&array);
    let tex =
        TextureObject::create(&device, &resource, &TextureDescriptor::default()).unwrap();
    let output = DeviceMemory::<f32>::allocate(&device, width).unwrap();

    let config = LaunchConfigBuilder::new()
        .grid_dim(((width as u32 + 31) / 32, 1, 1))
        .block_dim((32, 1, 1))
        .build();
    launch(&device, &config, |t| {
        let x = t.global_x() as usize;
        if x < width {
            output.store(x, tex.tex1d(x as f32)[0]);
        }
    })
    .unwrap();

    assert_eq!(output.copy_to_host().unwrap(), tex_data);
}

#[test]
fn test_3d_fetch_through_copy_kernel() {
    init_logging();
    let (width, height, depth) = (8usize, 4usize, 3usize);
    let total = width * height * depth;

    let device = Device::new(0).unwrap();
    let tex_data: Vec<f32> = (0..total).map(|i| i as f32).collect();
    let array = DeviceArray::allocate(
        &device,
        ChannelFormatDescriptor::float1(),
        width,
        height,
        depth,
    )
    .unwrap();
    array.copy_from(&tex_data, None).unwrap();

    let resource = ResourceDescriptor::from_array(&array);
    let tex_desc = TextureDescriptor::new(
        &[AddressMode::Clamp, AddressMode::Clamp, AddressMode::Clamp],
        FilterMode::Point,
        ReadMode::ElementType,
    );
    let tex = TextureObject::create(&device, &resource, &tex_desc).unwrap();
    let output = DeviceMemory::<f32>::allocate(&device, total).unwrap();

    let config = LaunchConfigBuilder::new()
        .grid_dim((2, 1, 1))
        .block_dim((4, 4, 3))
        .build();
    launch(&device, &config, |t| {
        let (x, y, z) = (
            t.global_x() as usize,
            t.global_y() as usize,
            t.global_z() as usize,
        );
        if x < width && y < height && z < depth {
            let texel = tex.tex3d(x as f32, y as f32, z as f32);
            output.store((z * height + y) * width + x, texel[0]);
        }
    })
    .unwrap();

    assert_eq!(output.copy_to_host().unwrap(), tex_data);
}
