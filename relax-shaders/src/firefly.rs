use relax_gpu::prelude::*;

#[spirv(compute(threads(8, 8)))]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &FireflyPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)] scaled_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] out_diffuse: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = Firefly {
        params,
        specular: &specular,
        diffuse: &diffuse,
        scaled_view_z: &scaled_view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
    }
}
