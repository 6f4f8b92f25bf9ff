//! Benchmarks for the mesh reducers.
//!
//! Run with: cargo bench -p polyreduce-simplification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polyreduce_simplification::{simplify, simplify_sloppy};
use std::collections::HashMap;

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// Create an icosphere with the given subdivision level.
fn create_sphere(subdivisions: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let phi = (1.0 + 5.0f32.sqrt()) / 2.0;
    let a = 1.0;
    let b = 1.0 / phi;

    let ico_verts = [
        [0.0, b, -a],
        [b, a, 0.0],
        [-b, a, 0.0],
        [0.0, b, a],
        [0.0, -b, a],
        [-a, 0.0, b],
        [0.0, -b, -a],
        [a, 0.0, -b],
        [a, 0.0, b],
        [-a, 0.0, -b],
        [b, -a, 0.0],
        [-b, -a, 0.0],
    ];

    let mut vertices: Vec<[f32; 3]> = ico_verts
        .iter()
        .map(|v| {
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            [v[0] / len, v[1] / len, v[2] / len]
        })
        .collect();

    let mut indices: Vec<u32> = [
        [0u32, 1, 2],
        [3, 2, 1],
        [3, 4, 5],
        [3, 8, 4],
        [0, 6, 7],
        [0, 9, 6],
        [4, 10, 11],
        [6, 11, 10],
        [2, 5, 9],
        [11, 9, 5],
        [1, 7, 8],
        [10, 8, 7],
        [3, 5, 2],
        [3, 1, 8],
        [0, 2, 9],
        [0, 7, 1],
        [6, 9, 11],
        [6, 10, 7],
        [4, 11, 5],
        [4, 8, 10],
    ]
    .iter()
    .flatten()
    .copied()
    .collect();

    for _ in 0..subdivisions {
        indices = subdivide_sphere(&mut vertices, &indices);
    }

    (vertices, indices)
}

fn subdivide_sphere(vertices: &mut Vec<[f32; 3]>, indices: &[u32]) -> Vec<u32> {
    let mut edge_midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut result = Vec::with_capacity(indices.len() * 4);

    for face in indices.chunks_exact(3) {
        let (v0, v1, v2) = (face[0], face[1], face[2]);

        let m01 = get_midpoint(v0, v1, vertices, &mut edge_midpoints);
        let m12 = get_midpoint(v1, v2, vertices, &mut edge_midpoints);
        let m20 = get_midpoint(v2, v0, vertices, &mut edge_midpoints);

        result.extend_from_slice(&[v0, m01, m20]);
        result.extend_from_slice(&[v1, m12, m01]);
        result.extend_from_slice(&[v2, m20, m12]);
        result.extend_from_slice(&[m01, m12, m20]);
    }

    result
}

fn get_midpoint(
    v1: u32,
    v2: u32,
    vertices: &mut Vec<[f32; 3]>,
    edge_midpoints: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let key = if v1 < v2 { (v1, v2) } else { (v2, v1) };

    if let Some(&index) = edge_midpoints.get(&key) {
        return index;
    }

    let p1 = vertices[v1 as usize];
    let p2 = vertices[v2 as usize];

    let mx = (p1[0] + p2[0]) * 0.5;
    let my = (p1[1] + p2[1]) * 0.5;
    let mz = (p1[2] + p2[2]) * 0.5;
    let len = (mx * mx + my * my + mz * mz).sqrt();

    let index = vertices.len() as u32;
    vertices.push([mx / len, my / len, mz / len]);
    edge_midpoints.insert(key, index);
    index
}

// =============================================================================
// Simplification Benchmarks
// =============================================================================

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simplify");
    group.sample_size(20);

    let test_cases = [
        ("sphere_1280tri", create_sphere(3)),
        ("sphere_5120tri", create_sphere(4)),
        ("sphere_20480tri", create_sphere(5)),
    ];

    for (name, (vertices, indices)) in &test_cases {
        let target = indices.len() / 4;

        group.throughput(Throughput::Elements((indices.len() / 3) as u64));

        group.bench_with_input(
            BenchmarkId::new("quadric_25pct", name),
            &(vertices, indices, target),
            |bench, (vertices, indices, target)| {
                let mut destination = vec![0u32; indices.len()];
                bench.iter(|| {
                    simplify(
                        black_box(destination.as_mut_slice()),
                        black_box(indices.as_slice()),
                        black_box(vertices.as_slice()),
                        *target,
                        f32::MAX,
                    )
                    .unwrap()
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sloppy_25pct", name),
            &(vertices, indices, target),
            |bench, (vertices, indices, target)| {
                let mut destination = vec![0u32; indices.len()];
                bench.iter(|| {
                    simplify_sloppy(
                        black_box(destination.as_mut_slice()),
                        black_box(indices.as_slice()),
                        black_box(vertices.as_slice()),
                        *target,
                        0.0,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_simplify);
criterion_main!(benches);
