//! Copy round-trip tests across ranks and stream modes
//!
//! Explicit enumeration over the {dimension triple, stream mode} product,
//! one triple per supported rank.

use crate::prelude::*;
use rand::Rng;

/// One triple per supported rank
const DIMENSIONS: [(usize, usize, usize); 3] = [(67, 0, 0), (67, 19, 0), (67, 19, 31)];

fn element_count((width, height, depth): (usize, usize, usize)) -> usize {
    width * height.max(1) * depth.max(1)
}

#[tokio::test]
async fn test_roundtrip_across_ranks_and_stream_modes() {
    let device = Device::new(0).unwrap();
    let mut rng = rand::thread_rng();

    for &dims in &DIMENSIONS {
        for use_stream in [false, true] {
            let (width, height, depth) = dims;
            let array = DeviceArray::allocate(
                &device,
                ChannelFormatDescriptor::float1(),
                width,
                height,
                depth,
            )
            .unwrap();

            let input: Vec<f32> = (0..element_count(dims)).map(|_| rng.gen()).collect();
            let mut output = vec![0.0f32; input.len()];

            let stream = Stream::new(&device, StreamFlags::default()).unwrap();
            let queue = use_stream.then_some(&stream);

            array.copy_from(&input, queue).unwrap();
            array.copy_to(&mut output, queue).unwrap();
            if use_stream {
                device.synchronize().await.unwrap();
            }

            assert_eq!(input, output, "dims {dims:?}, stream {use_stream}");
        }
    }
}

#[tokio::test]
async fn test_async_copy_equals_sync_copy() {
    let device = Device::new(0).unwrap();
    let array =
        DeviceArray::allocate(&device, ChannelFormatDescriptor::float1(), 67, 19, 0).unwrap();
    let input: Vec<f32> = (0..67 * 19).map(|i| (i as f32).sin()).collect();

    // Synchronous reference.
    let mut sync_output = vec![0.0f32; input.len()];
    array.copy_from(&input, None).unwrap();
    array.copy_to(&mut sync_output, None).unwrap();

    // Asynchronous pass over the same array.
    let stream = Stream::new(&device, StreamFlags::default()).unwrap();
    let mut async_output = vec![0.0f32; input.len()];
    array.copy_from(&input, Some(&stream)).unwrap();
    array.copy_to(&mut async_output, Some(&stream)).unwrap();
    stream.synchronize().await.unwrap();

    assert_eq!(sync_output, async_output);
    assert_eq!(sync_output, input);
}

#[test]
fn test_multi_channel_roundtrip() {
    let device = Device::new(0).unwrap();
    let array =
        DeviceArray::allocate(&device, ChannelFormatDescriptor::float4(), 16, 8, 0).unwrap();

    // Four f32 channels per element, flattened host-side.
    let input: Vec<f32> = (0..16 * 8 * 4).map(|i| i as f32 * 0.25).collect();
    let mut output = vec![0.0f32; input.len()];

    array.copy_from(&input, None).unwrap();
    array.copy_to(&mut output, None).unwrap();
    assert_eq!(input, output);
}

#[test]
fn test_integer_format_roundtrip() {
    let device = Device::new(0).unwrap();
    let desc = ChannelFormatDescriptor::unsigned(16, 1).unwrap();
    let array = DeviceArray::allocate(&device, desc, 67, 0, 0).unwrap();

    let input: Vec<u16> = (0..67).map(|i| i * 3).collect();
    let mut output = vec![0u16; input.len()];

    array.copy_from(&input, None).unwrap();
    array.copy_to(&mut output, None).unwrap();
    assert_eq!(input, output);
}

#[test]
fn test_host_buffer_of_wider_type() {
    // Byte-for-byte transfers do not care about the host element type as
    // long as the total length matches.
    let device = Device::new(0).unwrap();
    let array =
        DeviceArray::allocate(&device, ChannelFormatDescriptor::float1(), 16, 0, 0).unwrap();

    let input: Vec<u8> = (0..64).collect();
    let mut output = vec![0u8; 64];
    array.copy_from(&input, None).unwrap();
    array.copy_to(&mut output, None).unwrap();
    assert_eq!(input, output);
}

#[test]
fn test_reallocation_reuses_budget() {
    let mut properties = DeviceProperties::default();
    properties.total_memory = 1024;
    let device = Device::with_properties(0, properties).unwrap();
    let desc = ChannelFormatDescriptor::float1();

    for _ in 0..8 {
        let array = DeviceArray::allocate(&device, desc, 256, 0, 0).unwrap();
        assert_eq!(device.memory_used(), 1024);
        drop(array);
        assert_eq!(device.memory_used(), 0);
    }
}
