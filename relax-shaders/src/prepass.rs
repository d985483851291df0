use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)] params: &PrepassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] out_diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] out_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)] out_scaled_view_z: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = Prepass {
        params,
        specular: &specular,
        diffuse: &diffuse,
        normal_roughness: &normal_roughness,
        view_z: &view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
        out_view_z.write(screen_pos, out.view_z);
        out_scaled_view_z.write(screen_pos, out.scaled_view_z);
    }
}
