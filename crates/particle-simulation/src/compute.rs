//! Per-frame force and integration dispatch.

use crate::store::ParticleStore;
use particle_physics::WORKGROUP_SIZE;

pub struct ComputeStage {
    accumulate_pipeline: wgpu::ComputePipeline,
    integrate_pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    // Keyed on the store generation it was built against
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl ComputeStage {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Life Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle_life.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Life Bind Group Layout"),
            entries: &[
                // Particles
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Interaction matrix
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Sim params
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Click
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Life Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let accumulate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Accumulate Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("accumulate"),
            compilation_options: Default::default(),
            cache: None,
        });

        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integrate Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("integrate"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::info!("Compute pipelines created");

        Self {
            accumulate_pipeline,
            integrate_pipeline,
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Record both passes over the active particle buffer.
    ///
    /// Does nothing until the store has a published population.
    pub fn encode(&mut self, store: &ParticleStore, encoder: &mut wgpu::CommandEncoder) {
        let count = store.particle_count();
        if count == 0 {
            return;
        }
        self.refresh_bind_group(store);
        let Some((_, bind_group)) = &self.bind_group else {
            return;
        };

        let workgroup_count = count.div_ceil(WORKGROUP_SIZE);

        // Step 1: Accumulate forces into velocity
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Accumulate Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.accumulate_pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }

        // Step 2: Integrate positions
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integrate Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.integrate_pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }
    }

    /// Encode and submit one simulation step on its own command buffer.
    pub fn dispatch(&mut self, store: &ParticleStore) -> wgpu::SubmissionIndex {
        let mut encoder = store
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });
        self.encode(store, &mut encoder);
        store.queue().submit(std::iter::once(encoder.finish()))
    }

    fn refresh_bind_group(&mut self, store: &ParticleStore) {
        let generation = store.generation();
        if matches!(&self.bind_group, Some((built, _)) if *built == generation) {
            return;
        }
        let (Some(particles), Some(matrix)) =
            (store.active_particle_buffer(), store.active_matrix_buffer())
        else {
            return;
        };
        log::debug!("Rebuilding compute bind group for generation {generation}");

        let bind_group = store
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Particle Life Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: particles.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: matrix.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: store.params_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: store.click_buffer().as_entire_binding(),
                    },
                ],
            });
        self.bind_group = Some((generation, bind_group));
    }
}
