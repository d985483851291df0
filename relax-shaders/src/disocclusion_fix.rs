use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &DisocclusionFixPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] specular_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] diffuse_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] scaled_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 8)] out_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 9)]
    out_specular_responsive: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 10)]
    out_diffuse_responsive: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = DisocclusionFix {
        params,
        specular: &specular,
        diffuse: &diffuse,
        specular_responsive: &specular_responsive,
        diffuse_responsive: &diffuse_responsive,
        history_length: &history_length,
        normal_roughness: &normal_roughness,
        scaled_view_z: &scaled_view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
        out_specular_responsive.write(screen_pos, out.specular_responsive);
        out_diffuse_responsive.write(screen_pos, out.diffuse_responsive);
    }
}
