use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &ReprojectionPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] motion: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] prev_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] prev_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)]
    prev_specular_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 8)]
    prev_diffuse_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 9)] prev_normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 10)] prev_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 11)] prev_hit_distance: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 12)] prev_history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 13)] specular_confidence: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 14)] diffuse_confidence: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 15)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 16)] out_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 17)]
    out_specular_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 18)]
    out_diffuse_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 19)] out_hit_distance: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 20)] out_history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 21)]
    out_specular_confidence: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = Reprojection {
        params,
        specular: &specular,
        diffuse: &diffuse,
        motion: &motion,
        normal_roughness: &normal_roughness,
        view_z: &view_z,
        prev_specular: &prev_specular,
        prev_diffuse: &prev_diffuse,
        prev_specular_responsive: &prev_specular_responsive,
        prev_diffuse_responsive: &prev_diffuse_responsive,
        prev_normal_roughness: &prev_normal_roughness,
        prev_view_z: &prev_view_z,
        prev_hit_distance: &prev_hit_distance,
        prev_history_length: &prev_history_length,
        specular_confidence: &specular_confidence,
        diffuse_confidence: &diffuse_confidence,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
        out_specular_responsive.write(screen_pos, out.specular_responsive);
        out_diffuse_responsive.write(screen_pos, out.diffuse_responsive);
        out_hit_distance.write(screen_pos, out.hit_distance);
        out_history_length.write(screen_pos, out.history_length);
        out_specular_confidence.write(screen_pos, out.specular_confidence);
    }
}
