use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &SpatialVarianceEstimationPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] scaled_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] out_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)] out_normal_roughness: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = SpatialVarianceEstimation {
        params,
        specular: &specular,
        diffuse: &diffuse,
        history_length: &history_length,
        normal_roughness: &normal_roughness,
        scaled_view_z: &scaled_view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
        out_normal_roughness.write(screen_pos, out.normal_roughness);
    }
}
